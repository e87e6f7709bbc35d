//! Request/response pipeline shared by the page and the shell worker
//!
//! Everything that leaves the process goes through a [`Fetcher`]. The
//! network implementation lives in [`network`]; the shell worker handle
//! implements the same trait so the page never knows whether a response
//! came from the cache.

pub mod network;

pub use network::NetworkFetcher;

use crate::error::{IdeError, IdeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// HTTP methods the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Reads are the only requests the shell worker may answer from cache
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Build a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: vec![],
            body: None,
        }
    }

    /// Build a POST request with a body
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![],
            body: Some(body.into()),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Cache key: SHA256 of `METHOD URL`, hex encoded
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.to_string().as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// How a response relates to the shell's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same origin as the shell
    Basic,
    /// Cross-origin
    Cors,
    /// Redirect or otherwise unreadable response
    Opaque,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Cors => write!(f, "cors"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

/// A received (or cached) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub url: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Whether the status is 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only complete same-origin responses may be written to the shell cache
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> IdeResult<String> {
        String::from_utf8(self.body.clone())
            .map_err(|e| IdeError::connectivity(format!("response body is not UTF-8: {}", e)))
    }

    /// Look up a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Anything that can turn a request into a response.
///
/// Errors are transport failures (`IdeError::Connectivity`) or, for the
/// shell worker, a cache miss while offline. HTTP error statuses are
/// responses, not errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: Request) -> IdeResult<Response>;
}

/// Resolve an asset reference (`./app.js`, absolute URL) against the shell origin
pub fn resolve_url(base: &Url, reference: &str) -> IdeResult<Url> {
    base.join(reference).map_err(|e| IdeError::InvalidUrl {
        url: reference.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an absolute URL
pub fn parse_url(raw: &str) -> IdeResult<Url> {
    Url::parse(raw).map_err(|e| IdeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Classify a response by status and by whether it came from the shell's origin
pub fn classify_response(status: u16, url: &str, shell_origin: Option<&Url>) -> ResponseType {
    if (300..400).contains(&status) {
        return ResponseType::Opaque;
    }
    let same_origin = match (shell_origin, Url::parse(url)) {
        (Some(origin), Ok(target)) => origin.origin() == target.origin(),
        _ => false,
    };
    if same_origin {
        ResponseType::Basic
    } else {
        ResponseType::Cors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_is_read() {
        assert!(Method::Get.is_read());
        assert!(Method::Head.is_read());
        assert!(!Method::Post.is_read());
        assert!(!Method::Delete.is_read());
    }

    #[test]
    fn cache_key_depends_on_method() {
        let get = Request::get("https://ide.test/exec");
        let post = Request::post("https://ide.test/exec", "{}");
        assert_ne!(get.cache_key(), post.cache_key());
        assert_eq!(get.cache_key().len(), 64);
        assert_eq!(get.cache_key(), Request::get("https://ide.test/exec").cache_key());
    }

    #[test]
    fn resolve_relative_assets() {
        let base = parse_url("http://localhost:8080/ide/").unwrap();
        assert_eq!(
            resolve_url(&base, "./app.js").unwrap().as_str(),
            "http://localhost:8080/ide/app.js"
        );
        assert_eq!(
            resolve_url(&base, "./").unwrap().as_str(),
            "http://localhost:8080/ide/"
        );
        assert_eq!(
            resolve_url(&base, "https://cdn.tailwindcss.com").unwrap().as_str(),
            "https://cdn.tailwindcss.com/"
        );
    }

    #[test]
    fn classify_same_and_cross_origin() {
        let origin = parse_url("http://localhost:8080/").unwrap();
        assert_eq!(
            classify_response(200, "http://localhost:8080/app.js", Some(&origin)),
            ResponseType::Basic
        );
        assert_eq!(
            classify_response(200, "https://cdn.tailwindcss.com/", Some(&origin)),
            ResponseType::Cors
        );
        assert_eq!(
            classify_response(302, "http://localhost:8080/", Some(&origin)),
            ResponseType::Opaque
        );
        assert_eq!(
            classify_response(200, "http://localhost:8080/", None),
            ResponseType::Cors
        );
    }

    #[test]
    fn only_basic_200_is_cacheable() {
        let mut response = Response {
            status: 200,
            url: "http://localhost:8080/".into(),
            response_type: ResponseType::Basic,
            headers: vec![("Content-Type".into(), "text/html".into())],
            body: b"<html></html>".to_vec(),
        };
        assert!(response.is_cacheable());
        assert_eq!(response.header("content-type"), Some("text/html"));

        response.response_type = ResponseType::Cors;
        assert!(!response.is_cacheable());

        response.response_type = ResponseType::Basic;
        response.status = 206;
        assert!(!response.is_cacheable());
    }
}
