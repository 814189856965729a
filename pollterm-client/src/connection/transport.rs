//! Request/response transport to the terminal host

use std::time::Duration;

use async_trait::async_trait;
use pollterm_protocol::request::FORM_CONTENT_TYPE;
use pollterm_protocol::{Method, PollRequest};
use pollterm_utils::{PolltermError, Result};
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// One exchange with the host: send a poll request, return the reply body
///
/// Non-success statuses and network failures are errors; the body of a
/// successful reply is returned unparsed.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn exchange(&self, request: &PollRequest) -> Result<String>;
}

/// [`Transport`] over HTTP, backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `base`, aborting requests after `timeout`
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PolltermError::connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    fn endpoint(&self, request: &PollRequest) -> Result<Url> {
        let target = request.target();
        self.base.join(&target).map_err(|e| PolltermError::InvalidUrl {
            url: format!("{}{}", self.base, target),
            message: e.to_string(),
        })
    }

    fn map_error(&self, err: reqwest::Error) -> PolltermError {
        if err.is_timeout() {
            PolltermError::RequestTimeout {
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            PolltermError::connection(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: &PollRequest) -> Result<String> {
        let url = self.endpoint(request)?;

        let builder = match request.method {
            Method::Get => {
                let mut builder = self.client.get(url);
                for &(name, value) in request.cache_headers() {
                    builder = builder.header(name, value);
                }
                builder
            }
            Method::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(request.body().unwrap_or_default()),
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolltermError::http_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }

        response.text().await.map_err(|e| self.map_error(e))
    }
}

/// Parse a host base URL so that the endpoint path resolves beneath it
///
/// `http://host/term` and `http://host/term/` both yield requests to
/// `http://host/term/u`.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let invalid = |message: String| PolltermError::InvalidUrl {
        url: raw.to_string(),
        message,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
