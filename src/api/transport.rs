//! Purpose: Provide the HTTP transport seam used by the resource mapper.
//! Exports: `Transport`, `UreqTransport`, `DEFAULT_BASE_URL`.
//! Role: One authenticated GET primitive; everything above it is decoding.
//! Invariants: Construction performs no network I/O; auth is applied per request.
//! Invariants: Query slices contain only present parameters; omitted ones
//! never appear in the encoded URL.

use crate::api::ApiResult;
use crate::core::error::{Error, ErrorKind};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.affinity.co";

/// The one primitive the resource mapper needs: an authenticated GET that
/// yields a decoded JSON body or a classified error.
pub trait Transport {
    fn get(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Value>;
}

/// Blocking transport over a shared `ureq` agent. The agent reuses
/// connections across calls; the mapper never sees that detail.
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: Url,
    auth_header: String,
}

impl UreqTransport {
    pub fn new(api_key: &str) -> ApiResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url,
            auth_header: basic_auth_header(api_key),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for UreqTransport {
    fn get(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Value> {
        let url = build_url(&self.base_url, segments, query)?;
        tracing::debug!(url = %url, "GET");
        let response = self
            .agent
            .request("GET", url.as_str())
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json")
            .call();

        match response {
            Ok(resp) => read_json_body(resp),
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(Error::new(ErrorKind::Http)
                    .with_message(format!("request failed with status {status}"))
                    .with_status(status)
                    .with_body(body))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

/// Basic Authentication with an empty username; the password is the API key.
fn basic_auth_header(api_key: &str) -> String {
    let credentials = BASE64.encode(format!(":{api_key}"));
    format!("Basic {credentials}")
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::InvalidArgument)
            .with_message("invalid base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::InvalidArgument)
            .with_message("base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::InvalidArgument).with_message("base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::InvalidArgument).with_message("base url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

fn read_json_body(response: ureq::Response) -> ApiResult<Value> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("invalid response json")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{UreqTransport, basic_auth_header, build_url, normalize_base_url};
    use crate::core::error::ErrorKind;

    #[test]
    fn auth_header_encodes_empty_username() {
        // base64(":api-key")
        assert_eq!(basic_auth_header("api-key"), "Basic OmFwaS1rZXk=");
    }

    #[test]
    fn construction_is_offline() {
        let transport = UreqTransport::new("any-key").expect("transport");
        assert_eq!(transport.base_url().as_str(), "https://api.affinity.co/");
    }

    #[test]
    fn normalize_base_url_rejects_path() {
        let err = normalize_base_url("https://api.affinity.co/v2").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn normalize_base_url_rejects_other_schemes() {
        let err = normalize_base_url("ftp://api.affinity.co").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn build_url_joins_segments_and_query() {
        let base = normalize_base_url("https://api.affinity.co").expect("base");
        let url = build_url(
            &base,
            &["lists", "450", "list-entries"],
            &[("page_size", "10".to_string())],
        )
        .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.affinity.co/lists/450/list-entries?page_size=10"
        );
    }

    #[test]
    fn build_url_has_no_query_string_when_empty() {
        let base = normalize_base_url("https://api.affinity.co").expect("base");
        let url = build_url(&base, &["lists"], &[]).expect("url");
        assert_eq!(url.as_str(), "https://api.affinity.co/lists");
        assert!(url.query().is_none());
    }

    #[test]
    fn build_url_percent_encodes_values() {
        let base = normalize_base_url("https://api.affinity.co").expect("base");
        let url = build_url(&base, &["persons"], &[("term", "ada lovelace".to_string())])
            .expect("url");
        assert_eq!(url.query(), Some("term=ada+lovelace"));
    }
}
