use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// 超過這個數量的成分清單，前端會切換成兩欄排版
const WIDE_LAYOUT_THRESHOLD: usize = 6;

// ---------------------------------------------------------------------------
// Strapi v4 回應信封
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Entry<T> {
    pub id: u64,
    pub attributes: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<Entry<T>>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(rename = "pageCount")]
    pub page_count: usize,
    pub total: usize,
}

/// 媒體欄位：populate 後才有 data，否則為 null
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub data: Option<Entry<MediaAttributes>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaAttributes {
    pub url: String,
    #[serde(rename = "alternativeText", default)]
    pub alternative_text: Option<String>,
}

impl Media {
    /// CMS 可能回傳相對路徑（/uploads/...），一律轉成絕對 URL
    pub fn absolute_url(&self, base: &Url) -> Option<String> {
        let raw = &self.data.as_ref()?.attributes.url;
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(raw.clone())
        } else {
            // 去掉開頭斜線再 join，base 的路徑前綴才能保留
            base.join(raw.trim_start_matches('/'))
                .ok()
                .map(|u| u.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Cocktail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CocktailAttributes {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub glass: Option<String>,
    #[serde(default)]
    pub alcoholic: bool,
    #[serde(default)]
    pub ingredients: Vec<CocktailIngredient>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Media,
}

/// 配方內的一項成分（repeatable component，非關聯）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocktailIngredient {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub measure: Option<String>,
}

/// 顯示用 DTO：展平的雞尾酒加上衍生欄位
#[derive(Debug, Clone)]
pub struct Cocktail {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub glass: Option<String>,
    pub alcoholic: bool,
    pub ingredients: Vec<CocktailIngredient>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub wide_layout: bool,
}

impl Cocktail {
    pub fn from_entry(entry: Entry<CocktailAttributes>, media_base: &Url) -> Self {
        let attrs = entry.attributes;
        let image_url = attrs.image.absolute_url(media_base);
        let wide_layout = attrs.ingredients.len() > WIDE_LAYOUT_THRESHOLD;
        Self {
            id: entry.id,
            slug: attrs.slug,
            name: attrs.name,
            description: attrs.description,
            instructions: attrs.instructions,
            glass: attrs.glass,
            alcoholic: attrs.alcoholic,
            ingredients: attrs.ingredients,
            tags: attrs.tags,
            image_url,
            wide_layout,
        }
    }

    /// 成分 slug 集合（相似度計分用）
    pub fn ingredient_slugs(&self) -> BTreeSet<String> {
        self.ingredients.iter().map(|i| i.slug.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Ingredient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAttributes {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: IngredientKind,
    #[serde(default)]
    pub image: Media,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
    Spirit,
    Mixer,
    Garnish,
    #[default]
    Other,
}

#[derive(Debug, Clone)]
pub struct Ingredient {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: IngredientKind,
    pub image_url: Option<String>,
}

impl Ingredient {
    pub fn from_entry(entry: Entry<IngredientAttributes>, media_base: &Url) -> Self {
        let attrs = entry.attributes;
        let image_url = attrs.image.absolute_url(media_base);
        Self {
            id: entry.id,
            slug: attrs.slug,
            name: attrs.name,
            description: attrs.description,
            kind: attrs.kind,
            image_url,
        }
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleAttributes {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cover: Media,
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub cover_url: Option<String>,
}

impl Article {
    pub fn from_entry(entry: Entry<ArticleAttributes>, media_base: &Url) -> Self {
        let attrs = entry.attributes;
        let cover_url = attrs.cover.absolute_url(media_base);
        Self {
            id: entry.id,
            slug: attrs.slug,
            title: attrs.title,
            excerpt: attrs.excerpt,
            body: attrs.body,
            published_at: attrs.published_at,
            cover_url,
        }
    }
}

// ---------------------------------------------------------------------------
// Glossary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GlossaryTermAttributes {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone)]
pub struct GlossaryTerm {
    pub id: u64,
    pub term: String,
    pub definition: String,
    /// A–Z 索引字母；非字母開頭歸到 '#'
    pub index_letter: char,
}

impl GlossaryTerm {
    pub fn from_entry(entry: Entry<GlossaryTermAttributes>) -> Self {
        let attrs = entry.attributes;
        let index_letter = attrs
            .term
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .filter(|c| c.is_ascii_alphabetic())
            .unwrap_or('#');
        Self {
            id: entry.id,
            term: attrs.term,
            definition: attrs.definition,
            index_letter,
        }
    }
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct QuizAttributes {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    /// 正確選項在 choices 內的索引
    pub correct: usize,
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl Quiz {
    pub fn from_entry(entry: Entry<QuizAttributes>) -> Self {
        let attrs = entry.attributes;
        Self {
            id: entry.id,
            slug: attrs.slug,
            title: attrs.title,
            questions: attrs.questions,
        }
    }

    /// 對答案：多給的答案忽略，少給的算錯
    pub fn score(&self, answers: &[usize]) -> QuizScore {
        let correct = self
            .questions
            .iter()
            .zip(answers.iter())
            .filter(|(q, a)| q.correct == **a)
            .count();
        QuizScore {
            correct,
            total: self.questions.len(),
        }
    }
}
