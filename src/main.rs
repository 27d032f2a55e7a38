//! Recorder node CLI entry point

use std::process::ExitCode;

use clap::Parser;

use recorder_node::cli::{
    app::{load_merged_config, run_record, RecordOptions, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    decode_cmd::handle_decode_command,
    presenter::Presenter,
};
use recorder_node::domain::config::AppConfig;
use recorder_node::domain::recorder::MaxDuration;
use recorder_node::infrastructure::{init_logging, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let max_duration_arg = match &cli.command {
        Commands::Record { max_duration, .. } => *max_duration,
        _ => None,
    };
    let config = load_merged_config(AppConfig {
        max_duration: max_duration_arg,
        log_level: cli.log_level.clone(),
    })
    .await;

    if let Err(e) = init_logging(config.log_level_or_default()) {
        presenter.error(&format!("Failed to initialize logging: {}", e));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Decode { node, output } => {
            match handle_decode_command(&node, output, &presenter).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Commands::Record {
            max_duration,
            output,
            node,
        } => {
            // a saved node keeps its own duration unless one is given explicitly
            let max_duration = match (max_duration, &node) {
                (Some(secs), _) => Some(MaxDuration::from_secs(secs)),
                (None, Some(_)) => None,
                (None, None) => Some(config.max_duration_or_default()),
            };

            run_record(RecordOptions {
                max_duration,
                output,
                node,
            })
            .await
        }
    }
}
