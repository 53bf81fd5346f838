use super::DatasetSource;
use crate::cache::CategoryKey;
use crate::config::KitConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use surf::{Client, Config};
use utils::surf_logging::SurfLogging;
use utils::url::Url;

pub const DEFAULT_BASE_URL: &str = "https://cdn.jsdelivr.net/npm/@mdkva/tasbihkit/data";

/// Fetches category files from the jsDelivr mirror of the tasbihkit package.
#[derive(Clone)]
pub struct JsDelivr {
    http: Client,
    base_url: String,
}

impl Default for JsDelivr {
    fn default() -> Self {
        Self::new()
    }
}

impl JsDelivr {
    pub fn new() -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_config(config: &KitConfig) -> Result<Self> {
        let mut http_config = Config::new();
        if let Some(secs) = config.request_timeout_secs {
            http_config = http_config.set_timeout(Some(Duration::from_secs(secs)));
        }
        let http: Client = http_config.try_into().map_err(|err| Error::Config {
            reason: format!("failed to create HTTP client: {}", err),
        })?;

        Ok(Self {
            http: http.with(SurfLogging),
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the file for `category`. The key is inserted without further encoding.
    pub fn dataset_url(&self, category: &CategoryKey) -> Result<Url> {
        utils::url::join_file(&self.base_url, &category.file_name()).map_err(|err| {
            Error::fetch_failed(category, None, format!("invalid dataset URL: {}", err))
        })
    }
}

#[async_trait]
impl DatasetSource for JsDelivr {
    async fn fetch(&self, category: &CategoryKey) -> Result<String> {
        let url = self.dataset_url(category)?;

        let mut response = self
            .http
            .get(url)
            .await
            .map_err(|err| Error::fetch_failed(category, None, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failed(
                category,
                Some(u16::from(status)),
                format!(
                    "category file '{}' not found (Status: {})",
                    category.file_name(),
                    u16::from(status)
                ),
            ));
        }

        response.body_string().await.map_err(|err| {
            Error::fetch_failed(category, Some(u16::from(status)), err.to_string())
        })
    }
}
