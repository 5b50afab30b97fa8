use axum::http::HeaderMap;

use postbox_core::config::Config;

/// Check the admin password from either `Authorization: Bearer <pw>` or a
/// `?password=` query value. Exact string equality; no sessions.
pub fn password_ok(cfg: &Config, headers: &HeaderMap, query_password: Option<&str>) -> bool {
    if let Some(bearer) = bearer_token(headers) {
        if bearer == cfg.admin_password {
            return true;
        }
    }
    query_password == Some(cfg.admin_password.as_str())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn config() -> Config {
        let mut cfg = crate::test_fixtures::config();
        cfg.admin_password = "s3cret".to_string();
        cfg
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn bearer_header_matches() {
        let cfg = config();
        assert!(password_ok(&cfg, &headers_with_auth("Bearer s3cret"), None));
        assert!(!password_ok(&cfg, &headers_with_auth("Bearer wrong"), None));
        assert!(!password_ok(&cfg, &headers_with_auth("Basic s3cret"), None));
    }

    #[test]
    fn query_password_matches() {
        let cfg = config();
        assert!(password_ok(&cfg, &HeaderMap::new(), Some("s3cret")));
        assert!(!password_ok(&cfg, &HeaderMap::new(), Some("S3CRET")));
        assert!(!password_ok(&cfg, &HeaderMap::new(), None));
    }

    #[test]
    fn wrong_bearer_with_right_query_still_passes() {
        let cfg = config();
        assert!(password_ok(
            &cfg,
            &headers_with_auth("Bearer wrong"),
            Some("s3cret")
        ));
    }
}
