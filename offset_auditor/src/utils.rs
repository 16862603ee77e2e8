use anyhow::Context;
use std::future::Future;
use std::time::Duration;

/// Runs a single backend call, turning an elapsed deadline into an ordinary error.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, anyhow::Error>
where
    F: Future<Output = Result<T, anyhow::Error>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .with_context(|| format!("Timed out after {:?}", timeout))?
}
