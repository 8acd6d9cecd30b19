use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use haven_agents::{CompanionAgent, SubmitError, WallService};
use haven_core::CommunityGate;
use haven_observability::{init_tracing, AppMetrics};
use haven_responder::Responder;
use haven_storage::WallStore;

#[derive(Debug, Parser)]
#[command(name = "haven")]
#[command(about = "Haven companion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat with the companion.
    Chat,
    /// Community wall operations.
    Wall {
        #[command(subcommand)]
        command: WallCommand,
    },
}

#[derive(Debug, Subcommand)]
enum WallCommand {
    Post {
        message: String,
        #[arg(long)]
        mood: Option<String>,
    },
    List,
    Stats,
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("haven_cli");
    let cli = Cli::parse();

    let metrics = AppMetrics::shared();
    let store = match env::var("HAVEN_DATABASE_URL") {
        Ok(database_url) => WallStore::sqlite(&database_url).await?,
        Err(_) => WallStore::memory(),
    };
    let wall = WallService::new(CommunityGate::default(), Arc::new(store), metrics.clone());

    match cli.command {
        Command::Chat => {
            let responder = Responder::from_env()?;
            let agent = CompanionAgent::new(Arc::new(responder), metrics);
            run_chat(agent).await?;
        }
        Command::Wall { command } => match command {
            WallCommand::Post { message, mood } => {
                match wall.submit_post(&message, mood.as_deref()).await {
                    Ok(post) => println!("{}", serde_json::to_string_pretty(&post)?),
                    Err(SubmitError::Rejected(decision)) => {
                        println!("{}", serde_json::to_string_pretty(&decision)?);
                    }
                    Err(error) => return Err(error.into()),
                }
            }
            WallCommand::List => {
                let posts = wall.list_posts().await;
                println!("{}", serde_json::to_string_pretty(&posts)?);
            }
            WallCommand::Stats => {
                let stats = wall.stats().await;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            WallCommand::Sweep => {
                let removed = wall.sweep().await;
                println!("removed {removed} expired posts");
            }
        },
    }

    Ok(())
}

async fn run_chat(agent: CompanionAgent<Responder>) -> Result<()> {
    println!("Haven chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let turn = agent.handle_turn(message).await;

        println!("\n{}\n", turn.reply);

        if let Some(resources) = turn.resources {
            println!("{}", resources.title);
            println!("{}", resources.message);
            for entry in resources.entries {
                println!("- {}: {} ({})", entry.name, entry.contact, entry.available);
            }
            println!();
        }
    }

    Ok(())
}
