//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Join an API path onto the provider origin, keeping any base path prefix.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("https://www.linkedin.com", "/voyager/api/me")
                .unwrap()
                .as_str(),
            "https://www.linkedin.com/voyager/api/me"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080/proxy", "voyager/api/me")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/proxy/voyager/api/me"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(endpoint("not a url", "/x").is_err());
    }
}
