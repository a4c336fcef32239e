//! Config validation and endpoint URLs.

use relaymeter_core::MissingConfig;
use url::Url;
use uuid::Uuid;

/// Outcome of [`validate_api_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidation {
    /// Usable config.
    Valid,
    /// Required fields are empty.
    Missing(MissingConfig),
    /// The URL is not an `http(s)://host` URL.
    InvalidUrl(String),
    /// An explicit API id is not a UUID.
    InvalidApiId(String),
}

impl ConfigValidation {
    /// Returns true for [`ConfigValidation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, ConfigValidation::Valid)
    }
}

/// Checks that a URL and an id or key are present and well formed.
///
/// The key is opaque and only checked for presence; an explicit id must be
/// a UUID.
pub fn validate_api_config(
    api_url: &str,
    api_id: Option<&str>,
    api_key: Option<&str>,
) -> ConfigValidation {
    let api_url = api_url.trim();
    let api_id = api_id.map(str::trim).filter(|s| !s.is_empty());
    let api_key = api_key.map(str::trim).filter(|s| !s.is_empty());

    if let Some(missing) =
        MissingConfig::detect(!api_url.is_empty(), api_id.is_some() || api_key.is_some())
    {
        return ConfigValidation::Missing(missing);
    }

    if !is_http_url(api_url) {
        return ConfigValidation::InvalidUrl(api_url.to_string());
    }

    if let Some(id) = api_id {
        if Uuid::parse_str(id).is_err() {
            return ConfigValidation::InvalidApiId(id.to_string());
        }
    }

    ConfigValidation::Valid
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

// ============================================================================
// Endpoints
// ============================================================================

/// `GET {base}/apiStats/api/user-stats/{id}`.
pub fn user_stats_url(api_url: &str, api_id: &str) -> String {
    format!(
        "{}/apiStats/api/user-stats/{}",
        api_url.trim_end_matches('/'),
        api_id.trim()
    )
}

/// `POST {base}/apiStats/api/get-key-id`.
pub fn key_id_url(api_url: &str) -> String {
    format!("{}/apiStats/api/get-key-id", api_url.trim_end_matches('/'))
}

/// Web dashboard for an API id.
pub fn dashboard_url(api_url: &str, api_id: &str) -> String {
    format!(
        "{}/admin-next/api-stats?apiId={}",
        api_url.trim_end_matches('/'),
        api_id.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1b2c3d4e-0000-4000-8000-000000000001";

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            validate_api_config("", None, None),
            ConfigValidation::Missing(MissingConfig::Both)
        );
        assert_eq!(
            validate_api_config("", Some(ID), None),
            ConfigValidation::Missing(MissingConfig::ApiUrl)
        );
        assert_eq!(
            validate_api_config("https://relay.example.com", Some("  "), None),
            ConfigValidation::Missing(MissingConfig::ApiId)
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            validate_api_config("relay.example.com", Some(ID), None),
            ConfigValidation::InvalidUrl(_)
        ));
        assert!(matches!(
            validate_api_config("ftp://relay.example.com", Some(ID), None),
            ConfigValidation::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_invalid_api_id() {
        assert_eq!(
            validate_api_config("https://relay.example.com", Some("not-a-uuid"), None),
            ConfigValidation::InvalidApiId("not-a-uuid".to_string())
        );
    }

    #[test]
    fn test_key_only_is_valid() {
        assert!(validate_api_config("http://localhost:3000", None, Some("cr_abc")).is_valid());
        assert!(validate_api_config("https://relay.example.com", Some(ID), None).is_valid());
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            user_stats_url("https://relay.example.com/", ID),
            format!("https://relay.example.com/apiStats/api/user-stats/{ID}")
        );
        assert_eq!(
            key_id_url("https://relay.example.com"),
            "https://relay.example.com/apiStats/api/get-key-id"
        );
        assert_eq!(
            dashboard_url("https://relay.example.com", ID),
            format!("https://relay.example.com/admin-next/api-stats?apiId={ID}")
        );
    }
}
