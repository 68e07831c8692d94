use std::fmt::Write as _;

/// Strapi v4 篩選運算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    ContainsI,
    In,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::ContainsI => "$containsi",
            Self::In => "$in",
        }
    }
}

/// Strapi 允許的單頁上限
pub const MAX_PAGE_SIZE: usize = 100;

/// Strapi REST 查詢參數建構器。
///
/// 參數維持插入順序，同一個邏輯查詢永遠產生同一組參數，
/// cache key 與 request 去重都依賴這一點。
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paginate(mut self, page: usize, page_size: usize) -> Self {
        let page_size = page_size.min(MAX_PAGE_SIZE).max(1);
        self.params
            .push(("pagination[page]".to_string(), page.max(1).to_string()));
        self.params
            .push(("pagination[pageSize]".to_string(), page_size.to_string()));
        self
    }

    /// filters[a][b][$op]=value，path 支援巢狀關聯欄位
    pub fn filter(mut self, path: &[&str], op: FilterOp, value: &str) -> Self {
        self.params
            .push((filter_key(path, op, None), value.to_string()));
        self
    }

    /// filters[a][b][$in][0]=v0&filters[a][b][$in][1]=v1...
    pub fn filter_in<S: AsRef<str>>(mut self, path: &[&str], values: &[S]) -> Self {
        for (index, value) in values.iter().enumerate() {
            self.params.push((
                filter_key(path, FilterOp::In, Some(index)),
                value.as_ref().to_string(),
            ));
        }
        self
    }

    pub fn populate_all(mut self) -> Self {
        self.params.push(("populate".to_string(), "*".to_string()));
        self
    }

    pub fn populate(mut self, fields: &[&str]) -> Self {
        for (index, field) in fields.iter().enumerate() {
            self.params
                .push((format!("populate[{}]", index), (*field).to_string()));
        }
        self
    }

    pub fn sort(mut self, field: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.params
            .push(("sort[0]".to_string(), format!("{}:{}", field, direction)));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// 去重與快取用的 key："<collection>?k=v&k=v"
    pub fn cache_key(&self, collection: &str) -> String {
        let mut key = String::from(collection);
        for (index, (name, value)) in self.params.iter().enumerate() {
            let sep = if index == 0 { '?' } else { '&' };
            let _ = write!(key, "{}{}={}", sep, name, value);
        }
        key
    }
}

fn filter_key(path: &[&str], op: FilterOp, index: Option<usize>) -> String {
    let mut key = String::from("filters");
    for segment in path {
        let _ = write!(key, "[{}]", segment);
    }
    let _ = write!(key, "[{}]", op.as_str());
    if let Some(index) = index {
        let _ = write!(key, "[{}]", index);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params() {
        let query = Query::new().paginate(2, 25);
        assert_eq!(
            query.params(),
            &[
                ("pagination[page]".to_string(), "2".to_string()),
                ("pagination[pageSize]".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_size_is_clamped_to_cms_max() {
        let query = Query::new().paginate(1, 500);
        assert_eq!(query.params()[1].1, "100");

        let query = Query::new().paginate(0, 0);
        assert_eq!(query.params()[0].1, "1");
        assert_eq!(query.params()[1].1, "1");
    }

    #[test]
    fn test_filter_with_nested_relation_path() {
        let query = Query::new().filter(&["ingredients", "slug"], FilterOp::Eq, "gin");
        assert_eq!(
            query.params(),
            &[(
                "filters[ingredients][slug][$eq]".to_string(),
                "gin".to_string()
            )]
        );
    }

    #[test]
    fn test_filter_in_is_indexed() {
        let query = Query::new().filter_in(&["ingredients", "slug"], &["gin", "campari"]);
        assert_eq!(
            query.params(),
            &[
                (
                    "filters[ingredients][slug][$in][0]".to_string(),
                    "gin".to_string()
                ),
                (
                    "filters[ingredients][slug][$in][1]".to_string(),
                    "campari".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_containsi_search_filter() {
        let query = Query::new().filter(&["name"], FilterOp::ContainsI, "sour");
        assert_eq!(query.params()[0].0, "filters[name][$containsi]");
    }

    #[test]
    fn test_populate_and_sort() {
        let query = Query::new().populate(&["image"]).sort("publishedAt", true);
        assert_eq!(
            query.params(),
            &[
                ("populate[0]".to_string(), "image".to_string()),
                ("sort[0]".to_string(), "publishedAt:desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let build = || {
            Query::new()
                .filter(&["slug"], FilterOp::Eq, "negroni")
                .paginate(1, 1)
                .populate_all()
        };
        assert_eq!(
            build().cache_key("cocktails"),
            build().cache_key("cocktails")
        );
        assert_eq!(
            build().cache_key("cocktails"),
            "cocktails?filters[slug][$eq]=negroni&pagination[page]=1&pagination[pageSize]=1&populate=*"
        );
    }
}
