pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};
pub use crate::config::TomlConfig;

pub use crate::core::catalog::{
    ArticleService, CocktailService, GlossaryService, IngredientService, QuizService,
};
pub use crate::core::client::CmsClient;
pub use crate::core::query::{FilterOp, Query};
pub use crate::utils::error::{CatalogError, Result};
