use crate::demo::{run_demo, run_roster_validate, DemoArgs, RosterValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};

use matricula::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Portal de Matrícula",
    about = "Run and demonstrate the student enrollment portal from the command line",
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
    /// Inspect an admissions roster CSV before importing it
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
    /// Run an end-to-end CLI demo covering submissions, review, and stages
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Parse a roster export and report the rows that would be imported
    Validate(RosterValidateArgs),
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
        Command::Roster {
            command: RosterCommand::Validate(args),
        } => run_roster_validate(args),
        Command::Demo(args) => run_demo(args),
    }
}
