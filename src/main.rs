mod cli;

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use procmine_client::{
    app_state::AppState,
    config::ClientConfig,
    models::graph::{chart_series, CategoryAmount, GraphResult},
    services::{error::FetchError, scope::ViewScope},
};

#[tokio::main]
async fn main() -> ExitCode {
    // Structured logs go to stderr; stdout carries the graph description
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().expect("Failed to load configuration from environment");
    let state = AppState::from_config(&config).expect("Failed to initialize backend clients");

    tracing::info!(
        backend = %state.api.client().base_url(),
        poll_interval_ms = config.poll_interval_ms,
        "Initialized process mining client"
    );

    // Ctrl-C tears the view down, which cancels whatever is in flight
    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let scope = ViewScope::child_of("cli", &shutdown);
    match scope.deliver(run(&state, &scope, cli.command)).await {
        Some(Ok(())) => ExitCode::SUCCESS,
        Some(Err(FetchError::Cancelled)) | None => ExitCode::from(130),
        Some(Err(e)) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(state: &AppState, scope: &ViewScope, command: Commands) -> Result<(), FetchError> {
    let cancel = scope.token();

    match command {
        Commands::Graph(args) => {
            let graph = state.api.graph(&args.to_params(), &cancel).await?;
            print_graph(&graph)?;
        }
        Commands::Dfg { approach } => {
            let graph = state.api.directly_follows_graph(approach, &cancel).await?;
            print_graph(&graph)?;
        }
        Commands::Methods => {
            for (approach, methods) in state.api.method_type_counts(&cancel).await? {
                println!("[{}]", approach);
                print_series(&chart_series(&methods));
            }
        }
        Commands::Approaches => {
            let counts = state.api.approach_counts(&cancel).await?;
            print_series(&chart_series(&counts));
        }
        Commands::Refresh { force } => {
            state.api.refresh_logs(force, &cancel).await?;
            println!("Logs refreshed");
        }
        Commands::Sample => {
            let body = state.simple.send_get_request(&cancel).await?;
            println!("{:#}", body);
        }
    }

    Ok(())
}

fn print_graph(graph: &GraphResult) -> Result<(), FetchError> {
    let dot = graph
        .dot_source()
        .map_err(|e| FetchError::Protocol(e.to_string()))?;
    println!("{}", dot);

    if graph.metadata.is_none() {
        return Ok(());
    }

    eprintln!("Sessions: {}", graph.number_of_sessions.unwrap_or(0));
    eprintln!("Banks:");
    for bar in graph.bank_series() {
        eprintln!("  {:<24} {}", bar.category, bar.amount);
    }
    eprintln!("Methods:");
    for bar in graph.method_series() {
        eprintln!("  {:<24} {}", bar.category, bar.amount);
    }
    eprintln!("Errors:");
    for share in graph.error_breakdown() {
        eprintln!("  {:<24} {:>6}%  ({})", share.item, share.pct, share.count);
    }

    Ok(())
}

fn print_series(series: &[CategoryAmount]) {
    for bar in series {
        println!("{:<24} {}", bar.category, bar.amount);
    }
}
