mod audit;
mod content;
mod dispatch;
mod gateway;
mod middleware;
mod workflow;

#[cfg(test)]
mod testutil;

use audit::ChatAuditSink;
use clap::{Parser, Subcommand};
use dispatch::Dispatcher;
use middleware::{AdminAudit, MiddlewareChain, TypingIndicator, UserWriteThrough};
use pitchbot_channels::TelegramTransport;
use pitchbot_core::{
    config,
    traits::{AuditSink, Planner, Transport, UserStore},
};
use pitchbot_planner::OpenAiPlanner;
use pitchbot_store::Store;
use std::sync::Arc;
use workflow::{SubmissionArena, Workflow};

#[derive(Parser)]
#[command(
    name = "pitchbot",
    version,
    about = "PitchBot — product-idea intake with human review"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check config, planner, and transport readiness.
    Status,
    /// Generate a one-shot plan for an idea, without starting the bot.
    Plan {
        /// The product idea.
        #[arg(trailing_var_arg = true)]
        idea: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            let planner = build_planner(&cfg)?;
            if !planner.is_available().await {
                anyhow::bail!("planner '{}' is not available", planner.name());
            }

            if !cfg.telegram.enabled {
                anyhow::bail!("Telegram is disabled. Enable it in config.toml.");
            }
            if cfg.telegram.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram is enabled but bot_token is empty. \
                     Set it in config.toml or the TELEGRAM_BOT_TOKEN env var."
                );
            }
            if cfg.telegram.reviewer_chat_id.is_empty() {
                anyhow::bail!("reviewer_chat_id is empty; approved ideas would have nowhere to go");
            }

            let transport: Arc<dyn Transport> =
                Arc::new(TelegramTransport::new(cfg.telegram.clone()));
            let store: Arc<dyn UserStore> = Arc::new(Store::new(&cfg.store).await?);
            let sink: Arc<dyn AuditSink> = Arc::new(ChatAuditSink::new(
                transport.clone(),
                cfg.telegram.admin_chat_id.clone(),
            ));

            // Fixed middleware order: typing, audit, write-through.
            let chain = MiddlewareChain::new(vec![
                Arc::new(TypingIndicator::new(transport.clone())),
                Arc::new(AdminAudit::new(sink, cfg.telegram.admin_chat_id.clone())),
                Arc::new(UserWriteThrough::new(store)),
            ]);

            let openai = cfg.planner.openai.clone().unwrap_or_default();
            let workflow = Workflow::new(
                planner,
                transport.clone(),
                SubmissionArena::new(),
                cfg.telegram.reviewer_chat_id.clone(),
                openai.max_tokens,
                openai.temperature,
            );

            println!("🚀 PitchBot — starting...");
            let gw = gateway::Gateway::new(transport, Dispatcher::new(chain, workflow));
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("PitchBot — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Planner: {}", cfg.planner.default);

            let planner = build_planner(&cfg)?;
            println!(
                "  {}: {}",
                planner.name(),
                if planner.is_available().await {
                    "available"
                } else {
                    "not available"
                }
            );

            println!(
                "  telegram: {}",
                if cfg.telegram.enabled && !cfg.telegram.bot_token.is_empty() {
                    "configured"
                } else if cfg.telegram.enabled {
                    "enabled but missing bot_token"
                } else {
                    "disabled"
                }
            );
            println!("  store: {}", cfg.store.db_path);
        }
        Commands::Plan { idea } => {
            if idea.is_empty() {
                anyhow::bail!("no idea provided. Usage: pitchbot plan <idea>");
            }

            let idea = idea.join(" ");
            let cfg = config::load(&cli.config)?;
            let planner = build_planner(&cfg)?;

            if !planner.is_available().await {
                anyhow::bail!(
                    "planner '{}' is not available. Is the API key configured?",
                    planner.name()
                );
            }

            let openai = cfg.planner.openai.clone().unwrap_or_default();
            let prompt = format!("Create a simple business plan for this product idea: {idea}");
            let plan = planner
                .generate(&prompt, openai.max_tokens, openai.temperature)
                .await?;
            println!("{plan}");
        }
    }

    Ok(())
}

/// Build the configured planner.
fn build_planner(cfg: &config::Config) -> anyhow::Result<Arc<dyn Planner>> {
    match cfg.planner.default.as_str() {
        "openai" => {
            let oc = cfg.planner.openai.clone().unwrap_or_default();
            Ok(Arc::new(OpenAiPlanner::from_config(&oc)))
        }
        other => anyhow::bail!("unsupported planner: {other}"),
    }
}
