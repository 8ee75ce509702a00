use crate::demo::{run_demo, run_evaluate, run_route, DemoArgs, InputArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lead_routing::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Routing Engine",
    about = "Route inbound brokerage leads to agents, teams, and ponds",
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
    /// Route a lead from a JSON routing input file and print the result
    Route(InputArgs),
    /// Evaluate rule conditions from a JSON file and print the clause trace
    Evaluate(InputArgs),
    /// Walk through the worked routing examples with a readable trace
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Route(args) => run_route(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Demo(args) => run_demo(args),
    }
}
