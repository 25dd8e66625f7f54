use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nestegg::api::{self, SimulateArgs};
use nestegg::report::LocaleSpec;

#[derive(Parser, Debug)]
#[command(name = "nestegg", about = "Monte Carlo retirement portfolio simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and print a text report
    Simulate(SimulateArgs),
    /// Serve the simulation HTTP API
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Simulate(args) => match api::run_cli_simulation(&args, &LocaleSpec::en_us()) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        },
        Command::Serve { port } => {
            if let Err(e) = api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
