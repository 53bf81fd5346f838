use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response, Result};

/// Logs every outgoing request and the status it came back with.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> Result<Response> {
        let method = req.method();
        let url = req.url().to_string();
        log::debug!("--> {} {}", method, url);

        let started = Instant::now();
        match next.run(req, client).await {
            Ok(res) => {
                log::debug!(
                    "<-- {} {} {} ({:?})",
                    method,
                    url,
                    res.status(),
                    started.elapsed()
                );
                Ok(res)
            }
            Err(err) => {
                log::debug!(
                    "<-- {} {} failed after {:?}: {}",
                    method,
                    url,
                    started.elapsed(),
                    err
                );
                Err(err)
            }
        }
    }
}
