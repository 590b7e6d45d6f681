//! Resource vault tree server (vaultd)

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod cache;
mod config;
mod drive;
mod error;
mod service;
mod tree;

use config::Config;
use service::TreeService;

#[derive(Parser)]
#[command(name = "vaultd")]
#[command(about = "Resource vault folder-tree server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server in the foreground
    Serve,
    /// Crawl one subject's folder and print the tree as JSON
    Tree {
        /// Subject slug (cs, ict)
        subject: String,
    },
    /// Check credentials and probe each configured root folder
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => {
            run_server(config).await?;
        }
        Commands::Tree { subject } => {
            print_tree(&config, &subject).await?;
        }
        Commands::Check => {
            run_check(&config).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let trees = TreeService::from_config(&config);
    let app_state = api::AppState::new(config.clone(), trees);

    let rest_addr = format!("0.0.0.0:{}", config.rest_port).parse()?;
    tracing::info!("REST listening on {}", rest_addr);
    api::rest::serve(rest_addr, app_state).await?;

    tracing::info!("{} stopped", config.server_name);
    Ok(())
}

async fn print_tree(config: &Config, subject: &str) -> anyhow::Result<()> {
    let root_id = config
        .folder_for(subject)
        .ok_or_else(|| anyhow::anyhow!("Unknown subject: {}", subject))?;

    let Some(root_id) = root_id else {
        eprintln!("no root folder configured for {}", subject);
        println!("[]");
        return Ok(());
    };

    let trees = TreeService::from_config(config);
    let tree = trees.get_tree(root_id).await?;

    let total: usize = tree.iter().map(tree::TreeNode::count).sum();
    eprintln!("{} top-level items, {} nodes", tree.len(), total);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

async fn run_check(config: &Config) -> anyhow::Result<()> {
    let trees = TreeService::from_config(config);
    let subjects = config
        .subject_folders
        .iter()
        .map(|(subject, root_id)| (subject.as_str(), root_id.as_deref()))
        .collect::<Vec<_>>();

    let report = trees.diagnostics(subjects).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.credential_error.is_some() {
        anyhow::bail!("credentials are malformed");
    }
    Ok(())
}
