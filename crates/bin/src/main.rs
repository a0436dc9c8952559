mod backend;
mod cli;
mod commands;
mod cookies;
mod flash;
mod output;
mod templates;

use clap::{Args, Command, FromArgMatches, Parser};

use crate::cli::{Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Info(args)) => commands::info::run(&args).await,
        Some(Commands::Users(command)) => commands::users::run(&command).await,
        None => {
            // Bare `currex` behaves like `currex serve`, picking up env config
            let matches =
                ServeArgs::augment_args(Command::new("currex")).try_get_matches_from(["currex"])?;
            let args = ServeArgs::from_arg_matches(&matches)?;
            commands::serve::run(&args).await
        }
    }
}
