//! The `current_user` session cookie.

use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "current_user";

/// Returns the value of cookie `name` from the request's `Cookie` headers.
pub fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value that stores the session token.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the session token.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn read_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; current_user=abc.def.ghi; lang=en"),
        );
        assert_eq!(read(&headers, SESSION_COOKIE), Some("abc.def.ghi"));
        assert_eq!(read(&headers, "lang"), Some("en"));
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn read_scans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("current_user=tok"));
        assert_eq!(read(&headers, SESSION_COOKIE), Some("tok"));
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok", 3600, false);
        assert!(cookie.starts_with("current_user=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));
        assert!(session_cookie("tok", 1, true).ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
