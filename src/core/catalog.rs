use crate::core::cache::{LatestWins, RequestCoalescer, TtlCache};
use crate::core::query::{FilterOp, Query, MAX_PAGE_SIZE};
use crate::core::similar::{rank_matches, rank_similar, IngredientMatch, SimilarCocktail};
use crate::domain::model::{
    Article, ArticleAttributes, Cocktail, CocktailAttributes, GlossaryTerm,
    GlossaryTermAttributes, Ingredient, IngredientAttributes, Page, Pagination, Quiz,
    QuizAttributes,
};
use crate::domain::ports::ContentApi;
use crate::utils::error::{CatalogError, Result};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// 相似查詢第一、二階段的單頁上限 = limit * FANOUT_MULTIPLIER
const FANOUT_MULTIPLIER: usize = 3;

async fn fetch_page<A: ContentApi, T: DeserializeOwned>(
    api: &A,
    collection: &str,
    query: &Query,
) -> Result<Page<T>> {
    let value = api.fetch_collection(collection, query).await?;
    Ok(serde_json::from_value(value)?)
}

/// 失敗就記 log 並降級成空結果（展示層永遠不該因網路錯誤掛掉）
pub fn degrade_to_empty<T: Default>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            if e.is_degradable() {
                tracing::warn!("⚠️ {} unavailable, returning empty: {}", what, e.user_message());
            } else {
                tracing::error!("❌ {} failed: {}", what, e);
            }
            T::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Cocktails
// ---------------------------------------------------------------------------

pub struct CocktailService<A: ContentApi> {
    api: Arc<A>,
    page_size: usize,
    all_cache: TtlCache<Vec<Cocktail>>,
    by_slug_inflight: RequestCoalescer<Option<Cocktail>>,
    search_gate: LatestWins,
}

impl<A: ContentApi> CocktailService<A> {
    const COLLECTION: &'static str = "cocktails";

    pub fn new(api: Arc<A>, page_size: usize, list_ttl: Duration) -> Self {
        Self {
            api,
            page_size,
            all_cache: TtlCache::new(list_ttl),
            by_slug_inflight: RequestCoalescer::new(),
            search_gate: LatestWins::new(),
        }
    }

    fn to_cocktails(&self, page: Page<CocktailAttributes>) -> Vec<Cocktail> {
        page.data
            .into_iter()
            .map(|entry| Cocktail::from_entry(entry, self.api.media_base()))
            .collect()
    }

    pub async fn list(&self, page: usize) -> Result<(Vec<Cocktail>, Option<Pagination>)> {
        let query = Query::new()
            .paginate(page, self.page_size)
            .populate_all()
            .sort("name", false);
        let raw: Page<CocktailAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        let pagination = raw.meta.pagination.clone();
        Ok((self.to_cocktails(raw), pagination))
    }

    /// 整批載入並快取一個 session（TTL 內重複呼叫不再打 API）
    pub async fn all(&self) -> Result<Arc<Vec<Cocktail>>> {
        self.all_cache.get_or_load(|| self.load_all()).await
    }

    async fn load_all(&self) -> Result<Vec<Cocktail>> {
        let mut cocktails = Vec::new();
        let mut page = 1;
        loop {
            let query = Query::new()
                .paginate(page, self.page_size)
                .populate_all()
                .sort("name", false);
            let raw: Page<CocktailAttributes> =
                fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
            let pagination = raw.meta.pagination.clone();
            cocktails.extend(self.to_cocktails(raw));
            match pagination {
                Some(p) if page < p.page_count => page += 1,
                _ => break,
            }
        }
        tracing::info!("📚 loaded {} cocktails into the session cache", cocktails.len());
        Ok(cocktails)
    }

    /// 以 slug 取單筆；同一 slug 的並發請求共用一次 HTTP 呼叫
    pub async fn by_slug(&self, slug: &str) -> Result<Option<Cocktail>> {
        let query = Query::new()
            .filter(&["slug"], FilterOp::Eq, slug)
            .paginate(1, 1)
            .populate_all();
        let key = query.cache_key(Self::COLLECTION);
        self.by_slug_inflight
            .run(&key, || async {
                let raw: Page<CocktailAttributes> =
                    fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                Ok(self.to_cocktails(raw).into_iter().next())
            })
            .await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Cocktail>> {
        let query = Query::new()
            .filter(&["name"], FilterOp::ContainsI, term)
            .paginate(1, self.page_size)
            .populate_all()
            .sort("name", false);
        let raw: Page<CocktailAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        Ok(self.to_cocktails(raw))
    }

    /// 互動式搜尋：回傳 None 表示這次結果已被更新的搜尋取代
    pub async fn search_latest(&self, term: &str) -> Result<Option<Vec<Cocktail>>> {
        let ticket = self.search_gate.begin();
        let results = self.search(term).await?;
        Ok(self.search_gate.settle(ticket, results))
    }

    pub async fn search_or_empty(&self, term: &str) -> Vec<Cocktail> {
        degrade_to_empty(self.search(term).await, "cocktail search")
    }

    /// 相似雞尾酒：有界的兩階段 fan-out，最多兩趟查詢，絕不全表掃描。
    ///
    /// 第一階段以成分交集（最特定的 facet）查詢；
    /// 候選不足 limit 才進第二階段，放寬到共享 tag。
    pub async fn similar(&self, slug: &str, limit: usize) -> Result<Vec<SimilarCocktail>> {
        let source =
            self.by_slug(slug)
                .await?
                .ok_or_else(|| CatalogError::NotFoundError {
                    resource: format!("cocktail '{}'", slug),
                })?;

        let bound = limit.saturating_mul(FANOUT_MULTIPLIER).clamp(1, MAX_PAGE_SIZE);
        let ingredient_slugs: Vec<String> = source.ingredient_slugs().into_iter().collect();

        let mut candidates = Vec::new();
        if !ingredient_slugs.is_empty() {
            let query = Query::new()
                .filter_in(&["ingredients", "slug"], &ingredient_slugs)
                .filter(&["slug"], FilterOp::Ne, &source.slug)
                .paginate(1, bound)
                .populate_all();
            let raw: Page<CocktailAttributes> =
                fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
            candidates = self.to_cocktails(raw);
        }

        let distinct: BTreeSet<&str> = candidates
            .iter()
            .filter(|c| c.slug != source.slug)
            .map(|c| c.slug.as_str())
            .collect();

        if distinct.len() < limit && !source.tags.is_empty() {
            tracing::debug!(
                "🔍 similar({}): {} candidates after phase 1, broadening to tags",
                source.slug,
                distinct.len()
            );
            let mut query = Query::new();
            for (index, tag) in source.tags.iter().enumerate() {
                let position = index.to_string();
                query = query.filter(&["$or", position.as_str(), "tags"], FilterOp::ContainsI, tag);
            }
            let query = query
                .filter(&["slug"], FilterOp::Ne, &source.slug)
                .paginate(1, bound)
                .populate_all();
            let raw: Page<CocktailAttributes> =
                fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
            candidates.extend(self.to_cocktails(raw));
        }

        Ok(rank_similar(&source, candidates, limit))
    }

    pub async fn similar_or_empty(&self, slug: &str, limit: usize) -> Vec<SimilarCocktail> {
        degrade_to_empty(self.similar(slug, limit).await, "similar cocktails")
    }

    /// 手上的材料能調什麼：一趟 $in 查詢 + 本地計分
    pub async fn make_with(&self, pantry: &[String], limit: usize) -> Result<Vec<IngredientMatch>> {
        let pantry: BTreeSet<String> = pantry.iter().map(|s| s.trim().to_lowercase()).collect();
        if pantry.is_empty() {
            return Ok(Vec::new());
        }

        let bound = limit.saturating_mul(FANOUT_MULTIPLIER).clamp(1, MAX_PAGE_SIZE);
        let slugs: Vec<String> = pantry.iter().cloned().collect();
        let query = Query::new()
            .filter_in(&["ingredients", "slug"], &slugs)
            .paginate(1, bound)
            .populate_all();
        let raw: Page<CocktailAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;

        let mut ranked = rank_matches(&pantry, self.to_cocktails(raw));
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn make_with_or_empty(&self, pantry: &[String], limit: usize) -> Vec<IngredientMatch> {
        degrade_to_empty(self.make_with(pantry, limit).await, "ingredient match")
    }
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

pub struct IngredientService<A: ContentApi> {
    api: Arc<A>,
    page_size: usize,
    all_cache: TtlCache<Vec<Ingredient>>,
    by_slug_inflight: RequestCoalescer<Option<Ingredient>>,
}

impl<A: ContentApi> IngredientService<A> {
    const COLLECTION: &'static str = "ingredients";

    pub fn new(api: Arc<A>, page_size: usize, list_ttl: Duration) -> Self {
        Self {
            api,
            page_size,
            all_cache: TtlCache::new(list_ttl),
            by_slug_inflight: RequestCoalescer::new(),
        }
    }

    fn to_ingredients(&self, page: Page<IngredientAttributes>) -> Vec<Ingredient> {
        page.data
            .into_iter()
            .map(|entry| Ingredient::from_entry(entry, self.api.media_base()))
            .collect()
    }

    pub async fn list(&self, page: usize) -> Result<(Vec<Ingredient>, Option<Pagination>)> {
        let query = Query::new()
            .paginate(page, self.page_size)
            .populate_all()
            .sort("name", false);
        let raw: Page<IngredientAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        let pagination = raw.meta.pagination.clone();
        Ok((self.to_ingredients(raw), pagination))
    }

    pub async fn all(&self) -> Result<Arc<Vec<Ingredient>>> {
        self.all_cache
            .get_or_load(|| async {
                let mut ingredients = Vec::new();
                let mut page = 1;
                loop {
                    let query = Query::new()
                        .paginate(page, self.page_size)
                        .populate_all()
                        .sort("name", false);
                    let raw: Page<IngredientAttributes> =
                        fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                    let pagination = raw.meta.pagination.clone();
                    ingredients.extend(self.to_ingredients(raw));
                    match pagination {
                        Some(p) if page < p.page_count => page += 1,
                        _ => break,
                    }
                }
                Ok(ingredients)
            })
            .await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<Ingredient>> {
        let query = Query::new()
            .filter(&["slug"], FilterOp::Eq, slug)
            .paginate(1, 1)
            .populate_all();
        let key = query.cache_key(Self::COLLECTION);
        self.by_slug_inflight
            .run(&key, || async {
                let raw: Page<IngredientAttributes> =
                    fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                Ok(self.to_ingredients(raw).into_iter().next())
            })
            .await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Ingredient>> {
        let query = Query::new()
            .filter(&["name"], FilterOp::ContainsI, term)
            .paginate(1, self.page_size)
            .populate_all()
            .sort("name", false);
        let raw: Page<IngredientAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        Ok(self.to_ingredients(raw))
    }

    pub async fn search_or_empty(&self, term: &str) -> Vec<Ingredient> {
        degrade_to_empty(self.search(term).await, "ingredient search")
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

pub struct ArticleService<A: ContentApi> {
    api: Arc<A>,
    page_size: usize,
    by_slug_inflight: RequestCoalescer<Option<Article>>,
}

impl<A: ContentApi> ArticleService<A> {
    const COLLECTION: &'static str = "articles";

    pub fn new(api: Arc<A>, page_size: usize) -> Self {
        Self {
            api,
            page_size,
            by_slug_inflight: RequestCoalescer::new(),
        }
    }

    fn to_articles(&self, page: Page<ArticleAttributes>) -> Vec<Article> {
        page.data
            .into_iter()
            .map(|entry| Article::from_entry(entry, self.api.media_base()))
            .collect()
    }

    /// 預設新文章在前
    pub async fn list(&self, page: usize) -> Result<(Vec<Article>, Option<Pagination>)> {
        let query = Query::new()
            .paginate(page, self.page_size)
            .populate(&["cover"])
            .sort("publishedAt", true);
        let raw: Page<ArticleAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        let pagination = raw.meta.pagination.clone();
        Ok((self.to_articles(raw), pagination))
    }

    pub async fn list_or_empty(&self, page: usize) -> Vec<Article> {
        degrade_to_empty(self.list(page).await.map(|(articles, _)| articles), "article list")
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let query = Query::new()
            .filter(&["slug"], FilterOp::Eq, slug)
            .paginate(1, 1)
            .populate(&["cover"]);
        let key = query.cache_key(Self::COLLECTION);
        self.by_slug_inflight
            .run(&key, || async {
                let raw: Page<ArticleAttributes> =
                    fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                Ok(self.to_articles(raw).into_iter().next())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Glossary
// ---------------------------------------------------------------------------

pub struct GlossaryService<A: ContentApi> {
    api: Arc<A>,
    page_size: usize,
    all_cache: TtlCache<Vec<GlossaryTerm>>,
}

impl<A: ContentApi> GlossaryService<A> {
    const COLLECTION: &'static str = "glossary-terms";

    pub fn new(api: Arc<A>, page_size: usize, list_ttl: Duration) -> Self {
        Self {
            api,
            page_size,
            all_cache: TtlCache::new(list_ttl),
        }
    }

    pub async fn all(&self) -> Result<Arc<Vec<GlossaryTerm>>> {
        self.all_cache
            .get_or_load(|| async {
                let mut terms = Vec::new();
                let mut page = 1;
                loop {
                    let query = Query::new().paginate(page, self.page_size).sort("term", false);
                    let raw: Page<GlossaryTermAttributes> =
                        fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                    let pagination = raw.meta.pagination.clone();
                    terms.extend(raw.data.into_iter().map(GlossaryTerm::from_entry));
                    match pagination {
                        Some(p) if page < p.page_count => page += 1,
                        _ => break,
                    }
                }
                Ok(terms)
            })
            .await
    }

    /// A–Z 分組（快取的整批清單在本地分組，不另外打 API）
    pub async fn grouped(&self) -> Result<BTreeMap<char, Vec<GlossaryTerm>>> {
        let terms = self.all().await?;
        let mut grouped: BTreeMap<char, Vec<GlossaryTerm>> = BTreeMap::new();
        for term in terms.iter() {
            grouped.entry(term.index_letter).or_default().push(term.clone());
        }
        for terms in grouped.values_mut() {
            terms.sort_by(|a, b| a.term.to_lowercase().cmp(&b.term.to_lowercase()));
        }
        Ok(grouped)
    }

    pub async fn grouped_or_empty(&self) -> BTreeMap<char, Vec<GlossaryTerm>> {
        degrade_to_empty(self.grouped().await, "glossary")
    }
}

// ---------------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------------

pub struct QuizService<A: ContentApi> {
    api: Arc<A>,
    page_size: usize,
    by_slug_inflight: RequestCoalescer<Option<Quiz>>,
}

impl<A: ContentApi> QuizService<A> {
    const COLLECTION: &'static str = "quizzes";

    pub fn new(api: Arc<A>, page_size: usize) -> Self {
        Self {
            api,
            page_size,
            by_slug_inflight: RequestCoalescer::new(),
        }
    }

    pub async fn list(&self, page: usize) -> Result<(Vec<Quiz>, Option<Pagination>)> {
        let query = Query::new().paginate(page, self.page_size).sort("title", false);
        let raw: Page<QuizAttributes> =
            fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
        let pagination = raw.meta.pagination.clone();
        Ok((
            raw.data.into_iter().map(Quiz::from_entry).collect(),
            pagination,
        ))
    }

    pub async fn list_or_empty(&self, page: usize) -> Vec<Quiz> {
        degrade_to_empty(self.list(page).await.map(|(quizzes, _)| quizzes), "quiz list")
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<Quiz>> {
        let query = Query::new()
            .filter(&["slug"], FilterOp::Eq, slug)
            .paginate(1, 1);
        let key = query.cache_key(Self::COLLECTION);
        self.by_slug_inflight
            .run(&key, || async {
                let raw: Page<QuizAttributes> =
                    fetch_page(self.api.as_ref(), Self::COLLECTION, &query).await?;
                Ok(raw.data.into_iter().map(Quiz::from_entry).next())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ContentApi;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Mutex;
    use url::Url;

    /// 測試用的假 CMS：每個 collection 一個 FIFO 回應佇列
    struct MockApi {
        base: Url,
        responses: Mutex<HashMap<String, VecDeque<serde_json::Value>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn new() -> Self {
            Self {
                base: Url::parse("https://cms.test").unwrap(),
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn push(&self, collection: &str, response: serde_json::Value) {
            self.responses
                .lock()
                .await
                .entry(collection.to_string())
                .or_default()
                .push_back(response);
        }

        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl ContentApi for MockApi {
        async fn fetch_collection(
            &self,
            collection: &str,
            query: &Query,
        ) -> Result<serde_json::Value> {
            self.calls.lock().await.push(query.cache_key(collection));
            let mut responses = self.responses.lock().await;
            Ok(responses
                .get_mut(collection)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| json!({"data": [], "meta": {}})))
        }

        fn media_base(&self) -> &Url {
            &self.base
        }
    }

    fn cocktail_json(slug: &str, name: &str, ingredients: &[&str], tags: &[&str]) -> serde_json::Value {
        json!({
            "id": 1,
            "attributes": {
                "slug": slug,
                "name": name,
                "alcoholic": true,
                "ingredients": ingredients.iter().map(|s| json!({"slug": s, "name": s})).collect::<Vec<_>>(),
                "tags": tags,
                "image": {"data": {"id": 1, "attributes": {"url": "/uploads/img.jpg"}}}
            }
        })
    }

    fn page_json(data: Vec<serde_json::Value>, page: usize, page_count: usize) -> serde_json::Value {
        let total = data.len();
        json!({
            "data": data,
            "meta": {"pagination": {"page": page, "pageSize": 25, "pageCount": page_count, "total": total}}
        })
    }

    fn cocktail_service(api: Arc<MockApi>) -> CocktailService<MockApi> {
        CocktailService::new(api, 25, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_list_maps_entries_and_derives_absolute_image_url() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            page_json(vec![cocktail_json("negroni", "Negroni", &["gin"], &[])], 1, 1),
        )
        .await;

        let service = cocktail_service(api.clone());
        let (cocktails, pagination) = service.list(1).await.unwrap();

        assert_eq!(cocktails.len(), 1);
        assert_eq!(cocktails[0].slug, "negroni");
        assert_eq!(
            cocktails[0].image_url.as_deref(),
            Some("https://cms.test/uploads/img.jpg")
        );
        assert_eq!(pagination.unwrap().total, 1);

        let calls = api.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("pagination[page]=1"));
        assert!(calls[0].contains("sort[0]=name:asc"));
    }

    #[tokio::test]
    async fn test_all_walks_every_page_then_serves_from_cache() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            page_json(vec![cocktail_json("americano", "Americano", &[], &[])], 1, 2),
        )
        .await;
        api.push(
            "cocktails",
            page_json(vec![cocktail_json("boulevardier", "Boulevardier", &[], &[])], 2, 2),
        )
        .await;

        let service = cocktail_service(api.clone());

        let all = service.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(api.calls().await.len(), 2);

        // TTL 內第二次呼叫不打 API
        let again = service.all().await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(api.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_by_slug_builds_eq_filter_and_returns_first() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            json!({"data": [cocktail_json("negroni", "Negroni", &["gin"], &[])], "meta": {}}),
        )
        .await;

        let service = cocktail_service(api.clone());
        let found = service.by_slug("negroni").await.unwrap();
        assert_eq!(found.unwrap().name, "Negroni");

        let missing = service.by_slug("no-such-drink").await.unwrap();
        assert!(missing.is_none());

        let calls = api.calls().await;
        assert!(calls[0].contains("filters[slug][$eq]=negroni"));
        assert!(calls[0].contains("pagination[pageSize]=1"));
    }

    #[tokio::test]
    async fn test_search_builds_containsi_filter() {
        let api = Arc::new(MockApi::new());
        let service = cocktail_service(api.clone());

        let results = service.search("sour").await.unwrap();
        assert!(results.is_empty());

        let calls = api.calls().await;
        assert!(calls[0].contains("filters[name][$containsi]=sour"));
    }

    #[tokio::test]
    async fn test_search_latest_returns_current_results() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            page_json(vec![cocktail_json("whiskey-sour", "Whiskey Sour", &[], &[])], 1, 1),
        )
        .await;

        let service = cocktail_service(api);
        let results = service.search_latest("sour").await.unwrap();
        assert_eq!(results.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_similar_stops_after_phase_one_when_enough_candidates() {
        let api = Arc::new(MockApi::new());
        // by_slug 的來源酒譜
        api.push(
            "cocktails",
            json!({"data": [cocktail_json("negroni", "Negroni", &["gin", "campari", "sweet-vermouth"], &["bitter"])], "meta": {}}),
        )
        .await;
        // 第一階段就有足夠候選
        api.push(
            "cocktails",
            page_json(
                vec![
                    cocktail_json("americano", "Americano", &["campari", "sweet-vermouth"], &[]),
                    cocktail_json("boulevardier", "Boulevardier", &["bourbon", "campari", "sweet-vermouth"], &[]),
                ],
                1,
                1,
            ),
        )
        .await;

        let service = cocktail_service(api.clone());
        let similar = service.similar("negroni", 2).await.unwrap();

        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].shared, 2);

        let calls = api.calls().await;
        // by_slug + 第一階段，沒有 tag fallback
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("filters[ingredients][slug][$in][0]="));
        assert!(calls[1].contains("filters[slug][$ne]=negroni"));
        assert!(calls[1].contains("pagination[pageSize]=6"));
    }

    #[tokio::test]
    async fn test_similar_broadens_to_tags_when_phase_one_is_short() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            json!({"data": [cocktail_json("mai-tai", "Mai Tai", &["rum", "orgeat"], &["tiki", "tropical"])], "meta": {}}),
        )
        .await;
        // 第一階段只撈到一杯
        api.push(
            "cocktails",
            page_json(vec![cocktail_json("daiquiri", "Daiquiri", &["rum", "lime-juice"], &[])], 1, 1),
        )
        .await;
        // 第二階段：tag fallback
        api.push(
            "cocktails",
            page_json(
                vec![cocktail_json("pina-colada", "Piña Colada", &["coconut-cream"], &["tropical"])],
                1,
                1,
            ),
        )
        .await;

        let service = cocktail_service(api.clone());
        let similar = service.similar("mai-tai", 3).await.unwrap();

        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].cocktail.slug, "daiquiri");
        assert_eq!(similar[1].cocktail.slug, "pina-colada");
        assert_eq!(similar[1].shared, 0);

        let calls = api.calls().await;
        // 最多兩趟候選查詢（加上 by_slug 共三次呼叫）
        assert_eq!(calls.len(), 3);
        assert!(calls[2].contains("filters[$or][0][tags][$containsi]=tiki"));
        assert!(calls[2].contains("filters[$or][1][tags][$containsi]=tropical"));
    }

    #[tokio::test]
    async fn test_similar_unknown_slug_is_not_found() {
        let api = Arc::new(MockApi::new());
        let service = cocktail_service(api);

        let err = service.similar("no-such-drink", 5).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFoundError { .. }));
    }

    #[tokio::test]
    async fn test_make_with_ranks_full_matches_first() {
        let api = Arc::new(MockApi::new());
        api.push(
            "cocktails",
            page_json(
                vec![
                    cocktail_json("negroni", "Negroni", &["gin", "campari", "sweet-vermouth"], &[]),
                    cocktail_json("gimlet", "Gimlet", &["gin", "lime-juice"], &[]),
                ],
                1,
                1,
            ),
        )
        .await;

        let service = cocktail_service(api.clone());
        let pantry = vec!["Gin".to_string(), "lime-juice".to_string(), "campari".to_string()];
        let matches = service.make_with(&pantry, 10).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].cocktail.slug, "gimlet");
        assert!(matches[0].is_full_match());
        assert_eq!(matches[1].missing, 1);

        // pantry slug 先正規化再進查詢
        let calls = api.calls().await;
        assert!(calls[0].contains("filters[ingredients][slug][$in]"));
        assert!(calls[0].contains("=gin"));
    }

    #[tokio::test]
    async fn test_make_with_huge_limit_clamps_page_size() {
        let api = Arc::new(MockApi::new());
        let service = cocktail_service(api.clone());

        let pantry = vec!["gin".to_string()];
        let matches = service.make_with(&pantry, usize::MAX).await.unwrap();
        assert!(matches.is_empty());

        // fan-out 上限飽和後夾在頁大小上限
        let calls = api.calls().await;
        assert!(calls[0].contains(&format!("pagination[pageSize]={}", MAX_PAGE_SIZE)));
    }

    #[tokio::test]
    async fn test_make_with_empty_pantry_short_circuits() {
        let api = Arc::new(MockApi::new());
        let service = cocktail_service(api.clone());

        let matches = service.make_with(&[], 10).await.unwrap();
        assert!(matches.is_empty());
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_article_list_sorts_newest_first_and_populates_cover() {
        let api = Arc::new(MockApi::new());
        let service = ArticleService::new(api.clone(), 25);

        service.list(1).await.unwrap();

        let calls = api.calls().await;
        assert!(calls[0].contains("sort[0]=publishedAt:desc"));
        assert!(calls[0].contains("populate[0]=cover"));
    }

    #[tokio::test]
    async fn test_glossary_grouped_by_index_letter() {
        let api = Arc::new(MockApi::new());
        let term = |id: u64, term: &str| {
            json!({"id": id, "attributes": {"term": term, "definition": "..."}})
        };
        api.push(
            "glossary-terms",
            page_json(vec![term(1, "muddle"), term(2, "Mist"), term(3, "dash")], 1, 1),
        )
        .await;

        let service = GlossaryService::new(api.clone(), 25, Duration::from_secs(300));
        let grouped = service.grouped().await.unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&'D'].len(), 1);
        let m_terms: Vec<&str> = grouped[&'M'].iter().map(|t| t.term.as_str()).collect();
        assert_eq!(m_terms, vec!["Mist", "muddle"]);

        // 分組用的是快取的整批清單
        let calls_before = api.calls().await.len();
        service.grouped().await.unwrap();
        assert_eq!(api.calls().await.len(), calls_before);
    }

    #[tokio::test]
    async fn test_quiz_by_slug() {
        let api = Arc::new(MockApi::new());
        api.push(
            "quizzes",
            json!({"data": [{"id": 9, "attributes": {
                "slug": "basics",
                "title": "Bar basics",
                "questions": [{"prompt": "Negroni base?", "choices": ["Gin", "Rum"], "correct": 0}]
            }}], "meta": {}}),
        )
        .await;

        let service = QuizService::new(api.clone(), 25);
        let quiz = service.by_slug("basics").await.unwrap().unwrap();

        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.score(&[0]).correct, 1);

        let calls = api.calls().await;
        assert!(calls[0].contains("filters[slug][$eq]=basics"));
    }

    #[tokio::test]
    async fn test_degrade_to_empty_converts_api_failure() {
        let failed: Result<Vec<Cocktail>> = Err(CatalogError::ApiStatusError {
            status: reqwest::StatusCode::BAD_GATEWAY,
            resource: "cocktails".to_string(),
        });
        assert!(degrade_to_empty(failed, "cocktail search").is_empty());

        let ok: Result<Vec<u32>> = Ok(vec![1]);
        assert_eq!(degrade_to_empty(ok, "test"), vec![1]);
    }
}
