//! Social CLI - draft, rank and store posts about a topic.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use llm::global_registry;
use social::{list_drafts, load_draft, run_pipeline, Config, DraftRecord, PostCandidate};

/// Social CLI - Generate ranked post drafts with a language model.
#[derive(Parser)]
#[command(name = "social")]
#[command(about = "Draft, rank and store social media posts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: <config dir>/social/config.toml)
    #[arg(long, global = true, env = "SOCIAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect facts about a topic and draft ranked posts
    Digest {
        /// Topic to write about
        topic: String,

        /// Look-back window in hours
        #[arg(long)]
        hours: Option<u32>,

        /// Number of posts to draft
        #[arg(long)]
        count: Option<usize>,

        /// Maximum characters per post
        #[arg(long)]
        chars: Option<usize>,

        /// LLM provider (see `social providers`)
        #[arg(long)]
        provider: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Drafts directory
        #[arg(long)]
        drafts_dir: Option<PathBuf>,
    },

    /// Inspect saved drafts
    Drafts {
        #[command(subcommand)]
        command: DraftsCommand,
    },

    /// List registered LLM providers
    Providers,
}

#[derive(Subcommand)]
pub enum DraftsCommand {
    /// List draft files
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show the posts in a draft file
    Show {
        /// Draft file path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("social=debug,llm=debug,info")
        } else {
            EnvFilter::new("social=info,llm=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?.with_overrides(|key| std::env::var(key).ok())?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Digest {
            topic,
            hours,
            count,
            chars,
            provider,
            model,
            drafts_dir,
        } => {
            if let Some(dir) = drafts_dir {
                config.drafts_dir = Some(dir);
            }
            let provider = provider.unwrap_or_else(|| config.provider.clone());
            let model = model.or_else(|| config.model.clone());

            let path = run_pipeline(
                &config,
                &topic,
                hours.unwrap_or(config.hours),
                count.unwrap_or(config.count),
                chars.unwrap_or(config.char_limit),
                &provider,
                model.as_deref(),
            )
            .await?;

            println!("✅ Drafts saved to {}", path.display());
            for (i, post) in load_draft(&path)?.iter().enumerate() {
                let score = post
                    .score()
                    .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
                println!("\n#{} [{}] {}", i + 1, score, post.text());
                if let Some(reason) = post.reason().filter(|r| !r.is_empty()) {
                    println!("   ↳ {reason}");
                }
            }
        }

        Commands::Drafts { command } => match command {
            DraftsCommand::List { category } => {
                let paths = list_drafts(&config, category.as_deref())?;
                if paths.is_empty() {
                    println!("No drafts in {}", config.drafts_dir().display());
                }
                for path in paths {
                    println!("{}", path.display());
                }
            }
            DraftsCommand::Show { path } => {
                let posts = load_draft(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                println!("{}", serde_json::to_string_pretty(&posts_json(&posts))?);
            }
        },

        Commands::Providers => {
            for name in global_registry().names() {
                let marker = if name == config.provider { " (default)" } else { "" };
                println!("{name}{marker}");
            }
        }
    }

    Ok(())
}

fn posts_json(posts: &[PostCandidate]) -> Vec<DraftRecord> {
    posts.iter().map(DraftRecord::from).collect()
}
