use clap::Parser;
use mimalloc::MiMalloc;
use readygate::cli::{Cli, Command};
use readygate::{Config, Initializer, Launcher};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load(cli.config.as_deref())?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        instance_dir = %cfg.storage.instance_dir.display(),
        database = %cfg.storage.database_path().display(),
        signal = %cfg.signal_path().display(),
        seed_policy = ?cfg.seed.policy,
        loglevel = %cfg.loglevel
    );

    match cli.command {
        Command::Init => {
            let report = Initializer::from_config(&cfg)?.run().await?;
            info!(
                created = ?report.seed.created,
                existing = ?report.seed.existing,
                skipped_nonempty = report.seed.skipped_nonempty,
                "init finished"
            );
        }
        Command::Launch => {
            Launcher::from_config(&cfg).run().await?;
        }
    }
    Ok(())
}
