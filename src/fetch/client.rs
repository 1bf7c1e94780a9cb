use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests for remote boundary and table sources.
///
/// Kept as a trait so callers can wrap the transport (proxies, headers)
/// without touching the loader.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
