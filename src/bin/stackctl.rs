use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use stackrun::config::loader;

#[derive(Parser)]
#[command(name = "stackctl")]
#[command(about = "Control CLI for the stackrun supervisor", long_about = None)]
struct Cli {
    /// Base URL of the supervisor's status API.
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stack-level status
    Status,
    /// List unit states, restarts, and exit codes
    Services,
    /// Validate a stack definition file
    Validate {
        /// Path to the stack definition.
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/stack", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Services => {
            let res = client.get(format!("{}/services", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Validate { config } => match loader::load_config(&config) {
            Ok(stack) => {
                println!(
                    "OK: stack \"{}\" with {} services",
                    stack.name,
                    stack.services.len()
                );
            }
            Err(e) => {
                eprintln!("Invalid: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status API returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
