use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use meklet::api::{self, AppState};
use meklet::page::DEFAULT_TEMPLATE;
use meklet::{Config, Query, SearchFlow, SearchPage};

#[derive(Parser)]
#[command(name = "meklet", version, about = "Front-end for the Meklet search engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the search page over HTTP
    Serve {
        /// Address to listen on, overrides MEKLET_BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a single search and print the results
    Search {
        query: String,
        #[arg(long)]
        advanced: bool,
        /// Print the results markup instead of plain text
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (also picks up `log` records from reqwest)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            let state = Arc::new(AppState::new(config)?);
            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });
            api::serve(state, shutdown).await?;
        }
        Command::Search {
            query,
            advanced,
            html,
        } => {
            let html_page = match &config.template_path {
                Some(path) => std::fs::read_to_string(path)?,
                None => DEFAULT_TEMPLATE.to_string(),
            };
            let page = SearchPage::from_html(&html_page)?;
            let flow = SearchFlow::new(&config, page)?;
            flow.search(Query::new(query, advanced)).await?;
            flow.settle_within(config.summary_wait).await;

            let results = flow.page().lock().await.results_html();
            if html {
                println!("{results}");
            } else {
                println!("{}", html2text::from_read(results.as_bytes(), 80)?);
            }
        }
    }
    Ok(())
}
