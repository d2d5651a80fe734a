mod commands;
mod view;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{parse_command, ReplCommand, HELP};
use node_client::{HttpNodeClient, NodeApi};
use panel_core::{load_settings, Coordinator, PanelSettings, SessionChange};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Control panel for local ledger nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file; defaults to ./panel.toml when present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Node port selected at start-up.
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    GenerateConfig {
        #[arg(short, long, value_name = "FILE", default_value_os_t = PathBuf::from("panel.toml"))]
        output: PathBuf,
    },
}

fn generate_config(path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(&PanelSettings::default())?;
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write settings to '{}'", path.display()))?;
    println!("Default settings written to: {}", path.display());
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

async fn render_events<N: NodeApi + 'static>(coordinator: Coordinator<N>) {
    let mut events = coordinator.subscribe_events();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "view fell behind session events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let state = coordinator.snapshot().await;
        for change in &event.changes {
            match change {
                SessionChange::Status => println!("{}", view::status_line(state.status.as_ref())),
                SessionChange::Chain => print_lines(&view::chain_lines(&state)),
                SessionChange::Availability => {
                    print_lines(&view::ports_lines(coordinator.directory(), &state))
                }
            }
        }
    }
}

async fn run_repl<N: NodeApi + 'static>(coordinator: Coordinator<N>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type 'help' for the list of commands.");
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match command {
            ReplCommand::Ports => {
                let state = coordinator.snapshot().await;
                print_lines(&view::ports_lines(coordinator.directory(), &state));
            }
            ReplCommand::SelectPort(port) => match coordinator.select_port(port).await {
                Ok(()) => println!("Current node port: {port}"),
                Err(err) => println!("{err}"),
            },
            ReplCommand::SetField(field, value) => {
                coordinator.update_pending_field(field, value).await;
            }
            ReplCommand::Run(action) => {
                tracing::debug!(action = action.kind().as_str(), "dispatching action");
                drop(coordinator.dispatch(action));
            }
            ReplCommand::Show => print_lines(&view::session_lines(&coordinator.snapshot().await)),
            ReplCommand::Status => {
                println!("{}", view::status_line(coordinator.snapshot().await.status.as_ref()))
            }
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Exit => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        return generate_config(output);
    }

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.node_host = host;
    }
    if let Some(port) = cli.port {
        settings.default_port = Some(port);
    }
    let directory = settings
        .node_directory()
        .context("invalid node settings")?;
    tracing::info!(
        host = %settings.node_host,
        ports = directory.ports().len(),
        default_port = %directory.default_port(),
        "starting node panel"
    );

    let client = Arc::new(HttpNodeClient::new(settings.node_host.clone()));
    let coordinator = Coordinator::new(client, directory);
    tokio::spawn(render_events(coordinator.clone()));
    run_repl(coordinator).await
}
