use super::{RecordSource, decompress};
use crate::error::SourceError;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use anyhow::Result;

/// Downloads one batch per URL.
pub struct HttpSource<C = BasicClient> {
    client: C,
    urls: Vec<String>,
}

impl HttpSource<BasicClient> {
    pub fn new(urls: Vec<String>) -> Self {
        Self::with_client(BasicClient::new(), urls)
    }
}

impl<C: HttpClient> HttpSource<C> {
    pub fn with_client(client: C, urls: Vec<String>) -> Self {
        Self { client, urls }
    }
}

#[async_trait::async_trait]
impl<C: HttpClient> RecordSource for HttpSource<C> {
    async fn list_units(&self) -> Result<Vec<String>> {
        Ok(self.urls.clone())
    }

    async fn read_unit(&self, unit: &str) -> Result<Vec<u8>, SourceError> {
        let bytes = fetch_bytes(&self.client, unit)
            .await
            .map_err(|e| SourceError::Fetch {
                unit: unit.to_string(),
                message: format!("{e:#}"),
            })?;
        decompress(unit, bytes)
    }
}
