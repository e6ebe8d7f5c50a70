use clap::{Args, Parser, Subcommand};

use procmine_client::models::params::{Approach, MethodType, OutputFormat, RequestParameters};

#[derive(Debug, Parser)]
#[command(name = "procmine", version, about = "Process mining graph and statistics client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Heuristic net for the selected filters, printed as DOT plus statistics
    Graph(GraphArgs),
    /// Directly-follows graph for one approach
    Dfg {
        #[arg(long)]
        approach: Approach,
    },
    /// Number of sessions per method type and approach
    Methods,
    /// Number of sessions per approach
    Approaches,
    /// Trigger log retrieval on the backend
    Refresh {
        /// Re-download logs that were already retrieved
        #[arg(long)]
        force: bool,
    },
    /// Fetch the fixed test resource with the single-shot GET
    Sample,
}

#[derive(Debug, Args)]
pub struct GraphArgs {
    #[arg(long)]
    pub approach: Approach,
    #[arg(long = "method-type")]
    pub method_type: Option<MethodType>,
    #[arg(long)]
    pub bank: Option<String>,
    #[arg(long = "error-type")]
    pub error_type: Option<String>,
    /// Dependency threshold between 0 and 1
    #[arg(long)]
    pub threshold: Option<f64>,
    #[arg(long, default_value = "dot")]
    pub format: OutputFormat,
}

impl GraphArgs {
    pub fn to_params(&self) -> RequestParameters {
        RequestParameters {
            approach: Some(self.approach),
            method_type: self.method_type,
            bank: self.bank.clone(),
            error_type: self.error_type.clone(),
            threshold: self.threshold,
            format: Some(self.format),
            force: None,
        }
    }
}
