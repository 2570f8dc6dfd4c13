// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use hugo_cms::utils::logging::{format_diff_line, format_info, format_success, format_warning};
use hugo_cms::{Config, ContentService, DiffKind, FrontMatterCodec};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hugo_cms")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Front matter normalization and semantic diffs for Hugo content", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List articles with their titles and unpublished-change flags
    List {
        #[arg(long)]
        json: bool,
    },

    /// Report whether an article differs semantically from the last commit
    Dirty {
        /// Content-relative path, e.g. posts/hello.md
        path: String,
    },

    /// Diff an edited file against the saved article and the last commit
    Diff {
        /// Content-relative path of the saved article
        path: String,

        #[arg(long, value_name = "FILE")]
        edited: PathBuf,
    },

    /// Print the normalized form of a document
    Normalize {
        file: PathBuf,

        /// Repository-relative path used to pick the collection schema
        #[arg(long, value_name = "REPO_PATH")]
        path: Option<String>,
    },

    /// Parse a document and print it as JSON
    Parse { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.color {
        colored::control::set_override(false);
    }
    hugo_cms::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::List { json } => cmd_list(config, json).await?,
        Commands::Dirty { path } => cmd_dirty(config, &path)?,
        Commands::Diff { path, edited } => cmd_diff(config, &path, edited)?,
        Commands::Normalize { file, path } => cmd_normalize(config, file, path.as_deref())?,
        Commands::Parse { file } => cmd_parse(file)?,
    }

    Ok(())
}

async fn cmd_list(config: Config, json: bool) -> Result<()> {
    let service = ContentService::open(config).context("Failed to open content repository")?;
    let articles = service
        .list_articles()
        .await
        .context("Failed to list articles")?;

    if json {
        println!("{}", serde_json::to_string_pretty(articles.as_ref())?);
        return Ok(());
    }

    for article in articles.iter() {
        let marker = if article.is_dirty {
            "M".yellow().bold()
        } else {
            " ".normal()
        };
        println!("{} {} {}", marker, article.path.cyan(), article.title);
    }

    let dirty = articles.iter().filter(|a| a.is_dirty).count();
    println!(
        "\n{}",
        format_info(&format!("{} articles, {} with unpublished changes", articles.len(), dirty))
    );
    Ok(())
}

fn cmd_dirty(config: Config, path: &str) -> Result<()> {
    let service = ContentService::open(config).context("Failed to open content repository")?;
    let dirty = service
        .check_dirty(path)
        .with_context(|| format!("Dirty check failed for {}", path))?;

    if dirty {
        println!("{}", format_warning(&format!("{} has unpublished changes", path)));
    } else {
        println!("{}", format_success(&format!("{} matches the last commit", path)));
    }
    Ok(())
}

fn cmd_diff(config: Config, path: &str, edited: PathBuf) -> Result<()> {
    let service = ContentService::open(config).context("Failed to open content repository")?;
    let edited_bytes =
        fs::read(&edited).with_context(|| format!("Failed to read {}", edited.display()))?;

    let saved_bytes = service
        .saved_bytes(path)
        .with_context(|| format!("Failed to read saved article {}", path))?;
    let outcome = service
        .diff(&saved_bytes, &edited_bytes, path)
        .context("Diff failed")?;

    match outcome.kind {
        DiffKind::None => println!("{}", format_success("No changes")),
        DiffKind::Unsaved => {
            println!("{}", format_warning("Unsaved changes"));
            print_diff(&outcome.diff);
        }
        DiffKind::Git => {
            println!("{}", format_info("Changes since the last commit"));
            print_diff(&outcome.diff);
        }
    }
    Ok(())
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        println!("{}", format_diff_line(line));
    }
}

fn cmd_normalize(config: Config, file: PathBuf, path: Option<&str>) -> Result<()> {
    let raw = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let service = ContentService::open(config).context("Failed to open content repository")?;

    let schema = path.and_then(|p| service.engine().resolve_schema(p));
    if let Some(collection) = &schema {
        info!("Using collection schema '{}'", collection.name);
    }

    let normalized = service.engine().normalize_content(&raw, schema.as_ref());
    print!("{}", String::from_utf8_lossy(&normalized));
    Ok(())
}

fn cmd_parse(file: PathBuf) -> Result<()> {
    let raw = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mut document = FrontMatterCodec::new()
        .parse(&raw)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    document.path = file.display().to_string();

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
