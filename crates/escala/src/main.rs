mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use escala_core::EscalaConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EscalaConfig::from_env();
    if let Some(path) = cli.registry {
        config.registry_path = path;
    }

    dispatch(cli.command, &config).await
}

async fn dispatch(command: Commands, config: &EscalaConfig) -> Result<()> {
    match command {
        Commands::Parse { file, ocr, json } => cli::parse::run(config, &file, ocr, json).await,
        Commands::Register { label, id } => {
            cli::registry::run_register(config, &label.join(" "), id).await
        }
        Commands::Unregister { id } => cli::registry::run_unregister(config, id).await,
        Commands::Status { id } => cli::registry::run_status(config, id).await,
        Commands::Resolve { label } => cli::registry::run_resolve(config, &label.join(" ")).await,
        Commands::Plan {
            file,
            document,
            ocr,
            force,
            messages,
        } => {
            let options = cli::plan::PlanOptions {
                document: &document,
                ocr,
                force,
                messages,
            };
            cli::plan::run(config, &file, &options).await
        }
        Commands::Ack {
            target,
            id,
            declined,
        } => cli::ack::run(config, &target, id, !declined).await,
        Commands::Acks { document } => cli::ack::run_list(config, &document).await,
    }
}
