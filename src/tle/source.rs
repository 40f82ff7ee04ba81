use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::tle::FetchError;

pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

/// Remote provider of raw three-line element set text
pub trait TleSource: Send + Sync {
    fn fetch_text<'a>(&'a self, object_id: &'a str) -> SourceFuture<'a>;
}

/// Celestrak GP query endpoint (`?CATNR=<id>&FORMAT=TLE`)
pub struct CelestrakSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CelestrakSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(err)
        }
    }
}

impl TleSource for CelestrakSource {
    fn fetch_text<'a>(&'a self, object_id: &'a str) -> SourceFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("CATNR", object_id), ("FORMAT", "TLE")])
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            response.text().await.map_err(|e| self.classify(e))
        })
    }
}
