use std::time::Duration;

/// HTTP client settings for fetching remote provenances.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Upper bound on a single request. A tighter caller deadline wins.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: Some(Duration::from_secs(15)),
            user_agent: concat!("endorse/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}
