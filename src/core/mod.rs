pub mod cache;
pub mod catalog;
pub mod client;
pub mod query;
pub mod similar;

pub use crate::domain::model::{
    Article, Cocktail, GlossaryTerm, Ingredient, Page, Pagination, Quiz,
};
pub use crate::domain::ports::{CmsConfig, ContentApi};
pub use crate::utils::error::Result;
