//! Network transport backed by a blocking `ureq` agent

use crate::error::{IdeError, IdeResult};
use crate::fetch::{classify_response, Fetcher, Method, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;
use url::Url;

/// Sends requests over the network.
///
/// Redirects are followed; the response is classified by the URL it was
/// finally served from.
#[derive(Clone)]
pub struct NetworkFetcher {
    agent: ureq::Agent,
    shell_origin: Option<Url>,
}

impl NetworkFetcher {
    /// Create a fetcher with a global per-request timeout
    pub fn new(timeout: Duration, shell_origin: Option<Url>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            shell_origin,
        }
    }

    fn send_blocking(&self, request: Request) -> IdeResult<Response> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match method {
            Method::Get | Method::Head | Method::Delete => {
                let mut builder = match method {
                    Method::Get => self.agent.get(&url),
                    Method::Head => self.agent.head(&url),
                    _ => self.agent.delete(&url),
                };
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post | Method::Put => {
                let mut builder = if method == Method::Post {
                    self.agent.post(&url)
                } else {
                    self.agent.put(&url)
                };
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(body.unwrap_or_default())
            }
        };

        let mut response =
            result.map_err(|e| IdeError::connectivity(format!("{} {}: {}", method, url, e)))?;

        let status = response.status().as_u16();
        let final_url = response.get_uri().to_string();
        let response_headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| IdeError::connectivity(format!("reading body of {}: {}", url, e)))?;

        debug!("{} {} -> {} ({})", method, url, status, final_url);

        Ok(Response {
            status,
            response_type: classify_response(status, &final_url, self.shell_origin.as_ref()),
            url,
            headers: response_headers,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for NetworkFetcher {
    async fn fetch(&self, request: Request) -> IdeResult<Response> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.send_blocking(request))
            .await
            .map_err(|e| IdeError::Internal(format!("network task failed: {}", e)))?
    }
}
