use crate::demo::{run_demo, run_history, DemoArgs, HistoryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use nodues::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "No-Dues Clearance Portal",
    about = "Run and demonstrate the no-dues clearance workflow backend from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a role-scoped CLI demo over a seeded approvals gateway
    Demo(DemoArgs),
    /// Print the decision audit trail from the seeded gateway
    History(HistoryArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Role the served session acts as
    #[arg(long, default_value = "admin")]
    pub(crate) role: String,
    /// Actor identity stamped onto decisions
    #[arg(long, default_value = "portal-operator")]
    pub(crate) actor: String,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            role: "admin".to_string(),
            actor: "portal-operator".to_string(),
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::History(args) => run_history(args),
    }
}
