use crate::domain::ports::CmsConfig;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "barkeep")]
#[command(about = "Browse a Strapi-backed cocktail catalog from the terminal")]
pub struct CliConfig {
    /// CMS base URL
    #[arg(long, default_value = "http://localhost:1337")]
    pub cms_url: String,

    /// Bearer token for the CMS API
    #[arg(long, env = "BARKEEP_API_TOKEN")]
    pub api_token: Option<String>,

    #[arg(long, default_value = "25")]
    pub page_size: usize,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// TTL for the load-all list caches, in seconds
    #[arg(long, default_value = "300")]
    pub list_ttl_seconds: u64,

    /// Load CMS settings from a TOML file instead of flags
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List cocktails (paged)
    Cocktails {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show one cocktail by slug
    Cocktail { slug: String },
    /// Search cocktails by name
    Search { term: String },
    /// Cocktails similar to the given one
    Similar {
        slug: String,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// What can I make with these ingredient slugs?
    MakeWith {
        #[arg(value_delimiter = ',')]
        ingredients: Vec<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// List ingredients (paged)
    Ingredients {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show one ingredient by slug
    Ingredient { slug: String },
    /// List articles, newest first
    Articles {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show one article by slug
    Article { slug: String },
    /// The full glossary, grouped A-Z
    Glossary,
    /// List quizzes
    Quizzes,
    /// Play a quiz: pass your answers as choice indexes
    Quiz {
        slug: String,
        #[arg(long, value_delimiter = ',')]
        answers: Vec<usize>,
    },
}

impl CmsConfig for CliConfig {
    fn base_url(&self) -> &str {
        &self.cms_url
    }

    fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn list_ttl_seconds(&self) -> u64 {
        self.list_ttl_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("cms_url", &self.cms_url)?;
        validate_range("page_size", self.page_size, 1, 100)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        Ok(())
    }
}
