//! Mock server lifecycle and page serving tests

mod common;

use reqwest::StatusCode;

use common::{client, modem_dir, start};
use modemsim_common::Error;
use modemsim_server::MockServer;

const SB8200: &str = r#"
manufacturer: Arris
model: SB8200
auth:
  types: [none]
pages:
  data:
    root: {url: /, fixture: index.html}
    status: {url: /cmconnectionstatus.html, fixture: cmconnectionstatus.html}
    logo: {url: /images/logo.png, fixture: images/logo.png}
    events: {url: /cmeventlog.html, fixture: cmeventlog.html}
"#;

const STATUS_HTML: &[u8] = b"<html><body><table id=\"downstream\">\r\n<tr><td>1</td></tr></table></body></html>\n";
const LOGO: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

fn sb8200() -> tempfile::TempDir {
    modem_dir(
        SB8200,
        &[
            ("index.html", b"<html>home</html>"),
            ("cmconnectionstatus.html", STATUS_HTML),
            ("images/logo.png", LOGO),
        ],
    )
}

#[tokio::test]
async fn test_pages_round_trip_exact_bytes() {
    let tmp = sb8200();
    let (mut server, url) = start(tmp.path(), None).await;
    let http = client();

    for (path, expected, content_type) in [
        ("/", b"<html>home</html>".as_slice(), "text/html; charset=utf-8"),
        ("/cmconnectionstatus.html", STATUS_HTML, "text/html; charset=utf-8"),
        ("/images/logo.png", LOGO, "image/png"),
    ] {
        let resp = http.get(format!("{url}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], content_type);
        assert_eq!(resp.bytes().await.unwrap().as_ref(), expected, "{path}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path_and_missing_fixture_are_404() {
    let tmp = sb8200();
    let (mut server, url) = start(tmp.path(), None).await;
    let http = client();

    let resp = http.get(format!("{url}/not-a-page.html")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // declared page, no fixture on disk
    let resp = http.get(format!("{url}/cmeventlog.html")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // server keeps answering afterwards
    let resp = http.get(format!("{url}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_unsupported_auth_override() {
    let tmp = sb8200();
    let result = MockServer::new(tmp.path(), "127.0.0.1", 0, Some("kerberos"));
    assert!(matches!(result, Err(Error::UnsupportedAuthType(name)) if name == "kerberos"));
}

#[tokio::test]
async fn test_stop_is_idempotent_and_releases_port() {
    let tmp = sb8200();
    let (mut server, url) = start(tmp.path(), None).await;
    let addr = server.local_addr().unwrap();

    assert_eq!(client().get(&url).send().await.unwrap().status(), StatusCode::OK);

    server.stop().await;
    server.stop().await;
    assert!(server.url().is_none());
    assert!(client().get(&url).send().await.is_err());

    let listener = tokio::net::TcpListener::bind(addr).await;
    assert!(listener.is_ok(), "port {} still bound", addr.port());
}

#[tokio::test]
async fn test_drop_releases_port() {
    let tmp = sb8200();
    let (server, url) = start(tmp.path(), None).await;
    let addr = server.local_addr().unwrap();
    drop(server);

    // the serve task winds down asynchronously after cancellation
    let mut released = false;
    for _ in 0..50 {
        if tokio::net::TcpListener::bind(addr).await.is_ok() {
            released = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(released, "{url} still bound after drop");
}

#[tokio::test]
async fn test_two_servers_side_by_side() {
    let tmp = sb8200();
    let (mut a, url_a) = start(tmp.path(), None).await;
    let (mut b, url_b) = start(tmp.path(), None).await;
    assert_ne!(url_a, url_b);

    let http = client();
    for url in [&url_a, &url_b] {
        let resp = http.get(format!("{url}/cmconnectionstatus.html")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    a.stop().await;
    b.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests() {
    let tmp = sb8200();
    let (mut server, url) = start(tmp.path(), None).await;
    let http = client();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let http = http.clone();
        let url = format!("{url}/cmconnectionstatus.html");
        tasks.push(tokio::spawn(async move {
            http.get(url).send().await.unwrap().bytes().await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().as_ref(), STATUS_HTML);
    }

    server.stop().await;
}
