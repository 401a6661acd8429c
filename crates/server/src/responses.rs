//! Canned HTTP responses

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use modemsim_common::config::FormAuthConfig;
use modemsim_common::Fixture;

/// 200 with the fixture bytes as recorded
pub fn fixture(fixture: Fixture) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, fixture.content_type)],
        fixture.body,
    )
        .into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

/// `302 Found`, which is what modem firmware sends (not 303/307)
pub fn redirect(location: &str) -> Response {
    redirect_with_cookie(location, None)
}

pub fn redirect_with_cookie(location: &str, set_cookie: Option<String>) -> Response {
    let mut response = (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response();
    if let Some(cookie) = set_cookie {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// Built-in login form for form-auth modems that do not ship their own
pub fn login_form(config: &FormAuthConfig, status: StatusCode, error: Option<&str>) -> Response {
    let error = error
        .map(|msg| format!("<p class=\"error\">{msg}</p>\n"))
        .unwrap_or_default();
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
{error}<form method="post" action="{action}">
  <input type="text" name="{user}">
  <input type="password" name="{pass}">
  <input type="submit" value="Login">
</form>
</body>
</html>
"#,
        action = config.login_path,
        user = config.username_field,
        pass = config.password_field,
    );
    (status, Html(body)).into_response()
}
