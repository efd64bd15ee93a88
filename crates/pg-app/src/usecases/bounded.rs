use std::future::Future;
use std::time::Duration;

/// Run a port call under its own timeout, mapping expiry to `on_timeout`.
pub(crate) async fn bounded<T, E, F>(limit: Duration, call: F, on_timeout: E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout),
    }
}
