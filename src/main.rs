use anyhow::Context;
use barkeep::config::{CliConfig, Command, TomlConfig};
use barkeep::core::catalog::{
    ArticleService, CocktailService, GlossaryService, IngredientService, QuizService,
};
use barkeep::domain::ports::CmsConfig;
use barkeep::utils::{logger, validation::Validate};
use barkeep::{CatalogError, CmsClient};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting barkeep");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 設定檔優先於旗標
    let config: Box<dyn CmsConfig> = match &cli.config {
        Some(path) => {
            let toml_config = TomlConfig::from_file(path)
                .with_context(|| format!("loading config file {}", path.display()))?;
            if let Err(e) = toml_config.validate() {
                bail_config(&e);
            }
            Box::new(toml_config)
        }
        None => {
            if let Err(e) = cli.validate() {
                bail_config(&e);
            }
            Box::new(cli.clone())
        }
    };

    let client = match CmsClient::new(config.as_ref()) {
        Ok(client) => Arc::new(client),
        Err(e) => bail_config(&e),
    };

    if let Err(e) = run(cli.command, client, config.as_ref()).await {
        tracing::error!("❌ command failed: {}", e);
        eprintln!("❌ {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

fn bail_config(e: &CatalogError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    eprintln!("❌ {}", e.user_message());
    std::process::exit(2);
}

async fn run(
    command: Command,
    client: Arc<CmsClient>,
    config: &dyn CmsConfig,
) -> barkeep::Result<()> {
    let page_size = config.page_size();
    let list_ttl = Duration::from_secs(config.list_ttl_seconds());

    match command {
        Command::Cocktails { page } => {
            let service = CocktailService::new(client, page_size, list_ttl);
            let (cocktails, pagination) = service.list(page).await?;
            for cocktail in &cocktails {
                println!(
                    "🍸 {} ({}) - {} ingredients",
                    cocktail.name,
                    cocktail.slug,
                    cocktail.ingredients.len()
                );
            }
            if let Some(p) = pagination {
                println!("page {}/{} ({} total)", p.page, p.page_count, p.total);
            }
        }
        Command::Cocktail { slug } => {
            let service = CocktailService::new(client, page_size, list_ttl);
            let cocktail =
                service
                    .by_slug(&slug)
                    .await?
                    .ok_or_else(|| CatalogError::NotFoundError {
                        resource: format!("cocktail '{}'", slug),
                    })?;
            println!("🍸 {}", cocktail.name);
            if let Some(glass) = &cocktail.glass {
                println!("   glass: {}", glass);
            }
            println!(
                "   {}",
                if cocktail.alcoholic {
                    "alcoholic"
                } else {
                    "non-alcoholic"
                }
            );
            for ingredient in &cocktail.ingredients {
                match &ingredient.measure {
                    Some(measure) => println!("   - {} ({})", ingredient.name, measure),
                    None => println!("   - {}", ingredient.name),
                }
            }
            if let Some(instructions) = &cocktail.instructions {
                println!("\n{}", instructions);
            }
            if let Some(image_url) = &cocktail.image_url {
                println!("\n🖼️ {}", image_url);
            }
        }
        Command::Search { term } => {
            let service = CocktailService::new(client, page_size, list_ttl);
            let results = service.search_or_empty(&term).await;
            if results.is_empty() {
                println!("No cocktails matching '{}'", term);
            }
            for cocktail in &results {
                println!("🍸 {} ({})", cocktail.name, cocktail.slug);
            }
        }
        Command::Similar { slug, limit } => {
            let service = CocktailService::new(client, page_size, list_ttl);
            let similar = service.similar(&slug, limit).await?;
            if similar.is_empty() {
                println!("No similar cocktails found for '{}'", slug);
            }
            for entry in &similar {
                println!(
                    "🔗 {} ({}) shares {} ingredient(s)",
                    entry.cocktail.name, entry.cocktail.slug, entry.shared
                );
            }
        }
        Command::MakeWith { ingredients, limit } => {
            let service = CocktailService::new(client, page_size, list_ttl);
            let matches = service.make_with(&ingredients, limit).await?;
            if matches.is_empty() {
                println!("Nothing to shake with those ingredients.");
            }
            for entry in &matches {
                let total = entry.matched + entry.missing;
                if entry.is_full_match() {
                    println!("✅ {} - you have everything", entry.cocktail.name);
                } else {
                    println!(
                        "🛒 {} - {}/{} ingredients, {} missing",
                        entry.cocktail.name, entry.matched, total, entry.missing
                    );
                }
            }
        }
        Command::Ingredients { page } => {
            let service = IngredientService::new(client, page_size, list_ttl);
            let (ingredients, pagination) = service.list(page).await?;
            for ingredient in &ingredients {
                println!("🧉 {} ({})", ingredient.name, ingredient.slug);
            }
            if let Some(p) = pagination {
                println!("page {}/{} ({} total)", p.page, p.page_count, p.total);
            }
        }
        Command::Ingredient { slug } => {
            let service = IngredientService::new(client, page_size, list_ttl);
            let ingredient =
                service
                    .by_slug(&slug)
                    .await?
                    .ok_or_else(|| CatalogError::NotFoundError {
                        resource: format!("ingredient '{}'", slug),
                    })?;
            println!("🧉 {} ({:?})", ingredient.name, ingredient.kind);
            if let Some(description) = &ingredient.description {
                println!("{}", description);
            }
        }
        Command::Articles { page } => {
            let service = ArticleService::new(client, page_size);
            let articles = service.list_or_empty(page).await;
            for article in &articles {
                match article.published_at {
                    Some(at) => println!("📰 {} ({})", article.title, at.format("%Y-%m-%d")),
                    None => println!("📰 {} (draft)", article.title),
                }
            }
        }
        Command::Article { slug } => {
            let service = ArticleService::new(client, page_size);
            let article =
                service
                    .by_slug(&slug)
                    .await?
                    .ok_or_else(|| CatalogError::NotFoundError {
                        resource: format!("article '{}'", slug),
                    })?;
            println!("📰 {}\n", article.title);
            if let Some(body) = &article.body {
                println!("{}", body);
            }
        }
        Command::Glossary => {
            let service = GlossaryService::new(client, page_size, list_ttl);
            let grouped = service.grouped_or_empty().await;
            for (letter, terms) in &grouped {
                println!("\n== {} ==", letter);
                for term in terms {
                    println!("  {}: {}", term.term, term.definition);
                }
            }
        }
        Command::Quizzes => {
            let service = QuizService::new(client, page_size);
            let quizzes = service.list_or_empty(1).await;
            for quiz in &quizzes {
                println!("❓ {} ({}) - {} questions", quiz.title, quiz.slug, quiz.questions.len());
            }
        }
        Command::Quiz { slug, answers } => {
            let service = QuizService::new(client, page_size);
            let quiz = service
                .by_slug(&slug)
                .await?
                .ok_or_else(|| CatalogError::NotFoundError {
                    resource: format!("quiz '{}'", slug),
                })?;
            let score = quiz.score(&answers);
            println!("❓ {}", quiz.title);
            for (index, question) in quiz.questions.iter().enumerate() {
                let given = answers.get(index);
                let mark = match given {
                    Some(a) if *a == question.correct => "✅",
                    _ => "❌",
                };
                println!("{} {}", mark, question.prompt);
            }
            println!("\n🎯 Score: {}/{}", score.correct, score.total);
        }
    }

    Ok(())
}
