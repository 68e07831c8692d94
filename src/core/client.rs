use crate::core::query::Query;
use crate::domain::ports::{CmsConfig, ContentApi};
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Strapi REST API 的薄包裝。
///
/// 只負責送出請求與狀態碼檢查，不重試也不升級錯誤；
/// 降級成空結果是服務層的事。
#[derive(Debug)]
pub struct CmsClient {
    client: Client,
    base: Url,
    api_token: Option<String>,
}

impl CmsClient {
    pub fn new(config: &dyn CmsConfig) -> Result<Self> {
        let mut base = Url::parse(config.base_url()).map_err(|e| CatalogError::ConfigError {
            message: format!("Invalid CMS base URL '{}': {}", config.base_url(), e),
        })?;
        // 尾端補上斜線，路徑前綴（如 /cms）才不會在 join 時被吃掉
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base,
            api_token: config.api_token().map(str::to_string),
        })
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        self.base
            .join(&format!("api/{}", collection))
            .map_err(|e| CatalogError::ConfigError {
                message: format!("Cannot build URL for collection '{}': {}", collection, e),
            })
    }
}

#[async_trait]
impl ContentApi for CmsClient {
    async fn fetch_collection(&self, collection: &str, query: &Query) -> Result<serde_json::Value> {
        let url = self.collection_url(collection)?;

        let mut request = self.client.get(url).query(query.params());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("📡 GET {}", query.cache_key(collection));
        let response = request.send().await?;
        tracing::debug!("📡 {} response status: {}", collection, response.status());

        if !response.status().is_success() {
            return Err(CatalogError::ApiStatusError {
                status: response.status(),
                resource: collection.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    fn media_base(&self) -> &Url {
        &self.base
    }
}
