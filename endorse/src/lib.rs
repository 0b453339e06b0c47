//! Async host for the endorsement core: request files, concurrent provenance
//! loading on the blocking pool, and a single `endorse` entry point.
//!
//! Loaders are wrapped in [`HostLoader`], which keeps the blocking `reqwest`
//! client off the runtime's worker threads.

pub mod config;
mod loader;
pub mod types;

pub use config::load_request;
pub use endorse_core::FetchConfig;
pub use loader::HostLoader;
pub use types::{EndorsementRequest, HostError, ValiditySpec};

use endorse_core::types::claims::EndorsementStatement;
use endorse_core::{Cancellation, ParsedProvenance, generate_endorsement};
use tracing::instrument;

/// Load `uris` concurrently on the blocking pool.
///
/// The outcome matches [`endorse_core::ProvenanceLoader::load_provenances`]:
/// results are in input order, and when several URIs fail the error reported
/// is the one for the earliest URI. Outstanding loads are cancelled once that error is known.
#[instrument(skip(loader, cancel), fields(count = uris.len()))]
pub async fn load_provenances_concurrent(
    loader: &HostLoader,
    uris: &[String],
    cancel: &Cancellation,
) -> Result<Vec<ParsedProvenance>, HostError> {
    let batch = cancel.child();
    let handles: Vec<_> = uris
        .iter()
        .map(|uri| {
            let loader = loader.inner().clone();
            let uri = uri.clone();
            let batch = batch.clone();
            tokio::task::spawn_blocking(move || loader.load_provenance(&uri, &batch))
        })
        .collect();

    let mut provenances = Vec::with_capacity(uris.len());
    for (uri, handle) in uris.iter().zip(handles) {
        match handle.await {
            Ok(Ok(provenance)) => provenances.push(provenance),
            Ok(Err(err)) => {
                batch.cancel();
                tracing::debug!(%uri, "provenance failed to load, cancelling the rest");
                return Err(err.into());
            }
            Err(err) => {
                batch.cancel();
                return Err(HostError::join(uri.as_str(), err));
            }
        }
    }
    Ok(provenances)
}

/// Load the request's provenances and issue an endorsement if they verify.
#[instrument(skip_all, fields(binary_name = %request.binary_name))]
pub async fn endorse(
    loader: &HostLoader,
    request: &EndorsementRequest,
    cancel: &Cancellation,
) -> Result<EndorsementStatement, HostError> {
    let validity = request.validity.claim_validity()?;
    let cancel = match request.timeout() {
        Some(timeout) => cancel.clone().deadline_in(timeout),
        None => cancel.clone(),
    };

    let provenances = load_provenances_concurrent(loader, &request.provenances, &cancel).await?;
    let statement = generate_endorsement(
        &request.binary_name,
        &request.digests,
        &request.policy,
        &validity,
        &provenances,
    )?;
    tracing::info!(
        provenances = provenances.len(),
        not_after = %validity.not_after,
        "endorsement issued"
    );
    Ok(statement)
}
