//! Minimal PostgREST plumbing shared by the synced store and the catalogue
//!
//! Collections live under `{project}/rest/v1/<name>`. Every request carries
//! the project `apikey`; the bearer token is the user's access token when a
//! session exists and the api key otherwise.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::{parse_base_url, RemoteConfig};
use crate::error::{DictionaryError, SyncError};

/// HTTP access to PostgREST collections
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    rest_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl PostgrestClient {
    /// Client for the project in `config`
    pub fn new(config: &RemoteConfig, http: reqwest::Client) -> Result<Self, DictionaryError> {
        let mut rest_url = parse_base_url(&config.url)?;
        if let Ok(mut segments) = rest_url.path_segments_mut() {
            segments.pop_if_empty().push("rest").push("v1");
        }

        Ok(Self {
            rest_url,
            api_key: config.api_key.clone(),
            http,
        })
    }

    /// URL of a collection
    pub fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.rest_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection);
        }
        url
    }

    /// Start a request against a collection
    pub fn request(&self, method: Method, collection: &str, bearer: Option<&str>) -> RequestBuilder {
        let url = self.collection_url(collection);
        debug!(%method, %url, "remote request");

        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(self.api_key.as_str()))
    }

    /// Send a request, turning transport failures and error statuses into [`SyncError`]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let response = request.send().await.map_err(|e| SyncError::Request {
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(format_http_error(status, &body))
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(|e| SyncError::Request {
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| SyncError::Decode {
            message: e.to_string(),
        })
    }
}

/// Build an HTTP error, substituting `<empty>` for a blank body
pub fn format_http_error(status: StatusCode, body: &str) -> SyncError {
    let body = body.trim();
    SyncError::Http {
        status,
        body: if body.is_empty() {
            "<empty>".to_string()
        } else {
            body.to_string()
        },
    }
}

/// PostgREST equality filter value
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// PostgREST case-insensitive prefix filter value
///
/// `%`, `_` and `\` in the user's text are escaped so they match literally.
/// `*` cannot be escaped in a PostgREST filter and is dropped; only the
/// trailing wildcard is kept.
pub fn ilike_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 8);
    for c in prefix.chars() {
        match c {
            '*' => {}
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    format!("ilike.{}*", pattern)
}

/// Total row count from a `Content-Range: <range>/<total>` header
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> PostgrestClient {
        let config = RemoteConfig {
            url: url.to_string(),
            api_key: "anon".to_string(),
        };
        PostgrestClient::new(&config, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_collection_url() {
        assert_eq!(
            client("https://project.supabase.co").collection_url("favorites").as_str(),
            "https://project.supabase.co/rest/v1/favorites"
        );
        assert_eq!(
            client("http://127.0.0.1:54321/").collection_url("words").as_str(),
            "http://127.0.0.1:54321/rest/v1/words"
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(eq("run"), "eq.run");
        assert_eq!(ilike_prefix("he"), "ilike.he*");
        assert_eq!(ilike_prefix("h*e"), "ilike.he*");
    }

    #[test]
    fn test_ilike_prefix_matches_wildcards_literally() {
        assert_eq!(ilike_prefix("a_b"), r"ilike.a\_b*");
        assert_eq!(ilike_prefix("50%"), r"ilike.50\%*");
        assert_eq!(ilike_prefix(r"a\b"), r"ilike.a\\b*");
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-59/1234"), Some(1234));
        assert_eq!(parse_content_range_total("*/42"), Some(42));
        assert_eq!(parse_content_range_total("0-59/*"), None);
    }

    #[test]
    fn test_blank_error_body() {
        let err = format_http_error(StatusCode::UNAUTHORIZED, "  ");
        assert!(matches!(err, SyncError::Http { ref body, .. } if body == "<empty>"));
    }
}
