use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod lookup;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the relay server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8080")]
        port: String,
    },
    /// Run a saved GetUserAvailabilityRequest through the relay once
    Lookup {
        /// Path to the SOAP request body
        #[arg(long)]
        file: PathBuf,

        /// Only decode the request and print it, don't call the backend
        #[arg(long, action, default_value = "false")]
        decode_only: bool,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await;
        }
        Some(Command::Lookup { file, decode_only }) => {
            lookup::run(&file, decode_only).await?;
        }
        None => {}
    }

    Ok(())
}
