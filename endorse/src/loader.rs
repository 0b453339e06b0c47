use endorse_core::{FetchConfig, Fetcher, ProvenanceLoader};
use tokio::runtime::Handle;

use crate::types::HostError;

/// A [`ProvenanceLoader`] that can be held and dropped inside the async
/// runtime.
///
/// The blocking `reqwest` client behind [`Fetcher::from_config`] panics when
/// built or dropped on a runtime worker thread, so both happen on the
/// blocking pool.
#[derive(Debug)]
pub struct HostLoader {
    loader: Option<ProvenanceLoader>,
}

impl HostLoader {
    /// Build a loader over the production HTTP transport.
    pub async fn from_config(config: FetchConfig) -> Result<Self, HostError> {
        let fetcher = tokio::task::spawn_blocking(move || Fetcher::from_config(&config))
            .await
            .map_err(|err| HostError::ClientSetup(err.to_string()))??;
        Ok(Self::new(ProvenanceLoader::new(fetcher)))
    }

    /// Wrap a loader built elsewhere, for instance over a custom transport.
    pub fn new(loader: ProvenanceLoader) -> Self {
        Self {
            loader: Some(loader),
        }
    }

    pub(crate) fn inner(&self) -> &ProvenanceLoader {
        self.loader
            .as_ref()
            .expect("loader is only taken when dropped")
    }
}

impl Drop for HostLoader {
    fn drop(&mut self) {
        let Some(loader) = self.loader.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(loader));
            }
            Err(_) => drop(loader),
        }
    }
}
