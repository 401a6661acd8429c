//! Shared helpers for the mock server integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use modemsim_server::MockServer;
use tempfile::TempDir;

/// Write a modem definition with the given fixtures into a fresh temp dir
pub fn modem_dir(yaml: &str, fixtures: &[(&str, &[u8])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_modem(tmp.path(), yaml, fixtures);
    tmp
}

pub fn write_modem(dir: &Path, yaml: &str, fixtures: &[(&str, &[u8])]) {
    fs::create_dir_all(dir.join("fixtures")).unwrap();
    fs::write(dir.join("modem.yaml"), yaml).unwrap();
    for (name, data) in fixtures {
        let path = dir.join("fixtures").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }
}

/// Start a server on an ephemeral port
pub async fn start(dir: &Path, auth_type: Option<&str>) -> (MockServer, String) {
    let mut server = MockServer::new(dir, "127.0.0.1", 0, auth_type).unwrap();
    server.start().await.unwrap();
    let url = server.url().unwrap();
    (server, url)
}

/// Client that never follows redirects and keeps no cookie jar
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `name=value` part of the first `Set-Cookie` header
pub fn cookie_pair(resp: &reqwest::Response) -> String {
    let raw = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().trim().to_string()
}
