//! Worker binary for the Trend Squeeze pipeline: runs the full
//! discovery-to-publish cycle forever, or once with `--once`.

mod config;

use clap::Parser;

use squeeze_llm::{DynProvider, OpenAiChat};
use squeeze_pipeline::stages::{Curator, Editor, FeedDiscovery, WordPressPublisher, Writer};
use squeeze_pipeline::{
    RunExecutor, ShutdownFlag, StageRegistry, Supervisor, SupervisorConfig,
};

use config::WorkerConfig;

#[derive(Parser)]
#[command(
    name = "squeeze-worker",
    version,
    about = "Unattended trend-to-blog worker for Trend Squeeze"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run a single cycle and exit instead of looping
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = WorkerConfig::from_env()?;
    let openai = OpenAiChat::from_env()?;

    let mut registry = StageRegistry::new();
    registry.register(FeedDiscovery::new());
    registry.register(Curator::new(DynProvider::new(openai.clone())));
    registry.register(Writer::new(DynProvider::new(openai.clone())));
    registry.register(Editor::new(DynProvider::new(openai.clone())));
    registry.register(
        WordPressPublisher::new(
            &config.wordpress_url,
            &config.wordpress_username,
            &config.wordpress_password,
        )
        .with_image_client(openai),
    );

    let executor = RunExecutor::new(registry);

    if cli.once {
        let outcome = executor.run_once().await?;
        println!("Run {} finished: {}", outcome.run_id, outcome.record.status);
        for line in &outcome.record.trace {
            println!("  {line}");
        }
        if let Some(link) = &outcome.record.publication_link {
            println!("  Published: {link}");
        }
        return Ok(());
    }

    let shutdown = ShutdownFlag::new();
    shutdown.install_signals();

    let supervisor = Supervisor::new(
        executor,
        SupervisorConfig {
            interval: config.sleep,
            heartbeat: config.heartbeat,
            backoff_floor: config.backoff_floor,
            backoff_ceiling: config.backoff_ceiling,
            ..SupervisorConfig::default()
        },
        shutdown,
    );
    supervisor.run().await;

    tracing::info!("Worker stopped");
    Ok(())
}
