use std::fs;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::instrument;
use url::Url;

use crate::cancel::Cancellation;
use crate::config::FetchConfig;
use crate::error::{FetchError, TransportError};

/// Performs the HTTP GET behind `http`/`https` provenance URIs.
///
/// Implementations must return the full response body and release the
/// underlying connection before returning, on success and on error.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &Url, timeout: Option<Duration>) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    request_timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(TransportError::Client)?;
        Ok(Self {
            client,
            request_timeout: config.request_timeout,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get_json(&self, url: &Url, timeout: Option<Duration>) -> Result<Vec<u8>, TransportError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        let timeout = match (timeout, self.request_timeout) {
            (Some(caller), Some(configured)) => Some(caller.min(configured)),
            (caller, configured) => caller.or(configured),
        };
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(TransportError::Request)?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().map_err(TransportError::Body)?;
        Ok(body.to_vec())
    }
}

/// Resolves provenance URIs to raw bytes from local files or HTTP(S).
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetcher with a `reqwest` client built from `config`.
    ///
    /// The blocking client must not be built or dropped inside an async
    /// runtime; construct it up front or on a blocking thread.
    pub fn from_config(config: &FetchConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Fetch the bytes behind `uri`. Supported schemes are `file`, `http`
    /// and `https`; `file` URIs must have an empty host.
    #[instrument(skip(self, cancel))]
    pub fn fetch_bytes(&self, uri: &str, cancel: &Cancellation) -> Result<Vec<u8>, FetchError> {
        let url = match Url::parse(uri) {
            Ok(url) => url,
            // No scheme at all, e.g. a bare filesystem path.
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Err(FetchError::UnsupportedScheme {
                    uri: uri.to_string(),
                    scheme: String::new(),
                });
            }
            Err(source) => {
                return Err(FetchError::InvalidUri {
                    uri: uri.to_string(),
                    source,
                });
            }
        };

        match url.scheme() {
            "http" | "https" => {
                check_cancellation(uri, cancel)?;
                tracing::debug!("fetching provenance over HTTP");
                self.transport
                    .get_json(&url, cancel.remaining())
                    .map_err(|err| FetchError::transport(uri, err))
            }
            "file" => {
                check_cancellation(uri, cancel)?;
                read_local_file(uri, &url)
            }
            other => Err(FetchError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

fn check_cancellation(uri: &str, cancel: &Cancellation) -> Result<(), FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled {
            uri: uri.to_string(),
        });
    }
    if cancel.is_expired() {
        return Err(FetchError::DeadlineExceeded {
            uri: uri.to_string(),
        });
    }
    Ok(())
}

/// The authority of a `file://` URI as written. `Url` folds `localhost`
/// into an empty host, so the check runs on the raw text.
fn raw_file_authority(uri: &str) -> Option<&str> {
    let prefix = uri.get(..7)?;
    if !prefix.eq_ignore_ascii_case("file://") {
        return None;
    }
    let rest = &uri[7..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end]).filter(|authority| !authority.is_empty())
}

fn read_local_file(uri: &str, url: &Url) -> Result<Vec<u8>, FetchError> {
    if let Some(host) = raw_file_authority(uri) {
        return Err(FetchError::InvalidFileHost {
            uri: uri.to_string(),
            host: host.to_string(),
        });
    }

    let path = url.to_file_path().map_err(|_| FetchError::InvalidFilePath {
        uri: uri.to_string(),
    })?;

    match fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound {
            uri: uri.to_string(),
            path,
        }),
        Err(source) => Err(FetchError::Io {
            uri: uri.to_string(),
            source,
        }),
    }
}
