use crate::core::query::Query;
use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

pub trait CmsConfig: Send + Sync {
    fn base_url(&self) -> &str;
    fn api_token(&self) -> Option<&str>;
    fn page_size(&self) -> usize;
    fn timeout_seconds(&self) -> u64;
    fn list_ttl_seconds(&self) -> u64;
}

/// CMS 存取的接縫：服務層只依賴這個 trait，測試時可替換成假資料來源
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// GET /api/<collection>?<query>，回傳未解析的 JSON 信封
    async fn fetch_collection(&self, collection: &str, query: &Query) -> Result<serde_json::Value>;

    /// 相對媒體路徑要掛在哪個主機下
    fn media_base(&self) -> &Url;
}
