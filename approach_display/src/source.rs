use reqwest::header::HeaderMap;

use crate::error::{ApplicationError, ApplicationResult};

/// Something that hands back the raw body of one upstream source.
pub(crate) trait FeedSource {
    async fn fetch(&self) -> ApplicationResult<String>;
}

/// GET against a fixed URL. Timeouts come from the shared client; there is no
/// retry, a failed fetch is tried again on the next cycle.
#[derive(Debug, Clone)]
pub(crate) struct HttpSource {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

impl FeedSource for HttpSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> ApplicationResult<String> {
        let response = self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
