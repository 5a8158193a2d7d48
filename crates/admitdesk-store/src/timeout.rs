use std::future::Future;
use std::time::Duration;

use admitdesk_core::RepoError;

use crate::error::StoreError;

/// Runs a store call with an upper bound on its duration.
///
/// Elapsed calls surface as [`RepoError::Timeout`]; store errors are mapped
/// through `From<StoreError> for RepoError`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(RepoError::from),
        Err(_) => Err(RepoError::Timeout(limit)),
    }
}
