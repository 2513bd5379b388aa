use clap::{Parser, Subcommand};
use colored::*;
use serde_json::{json, Value};
use sorcerer_gateway::client::{ClientError, DegradedClient, FileKvStore, Listing};

#[derive(Parser, Debug)]
#[command(author, version, about = "Talks to a sorcerer gateway, falling back to locally cached personas")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    gateway: String,
    #[arg(long, default_value = ".sorcerer")]
    store_dir: String,
    /// Seeds the cosmetic follower/engagement figures.
    #[arg(long, default_value = "anonymous")]
    viewer: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a persona via /api/sorcerer-init.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "casual")]
        tone: String,
        #[arg(long, default_value = "")]
        background: String,
        #[arg(long, default_value = "lifestyle")]
        mode: String,
        /// Raw JSON payload; overrides the individual fields.
        #[arg(long)]
        payload: Option<String>,
    },
    List,
    Show { id: String },
}

fn print_entity(entity: &Value) {
    let id = entity.get("id").map(Value::to_string).unwrap_or_default();
    let name = entity.get("name").and_then(Value::as_str).unwrap_or("(unnamed)");
    let followers = entity.get("followers").and_then(Value::as_str).unwrap_or("-");
    let engagement = entity.get("engagement").and_then(Value::as_str).unwrap_or("-");
    let local = entity.get("local_only").and_then(Value::as_bool).unwrap_or(false);

    let tag = if local { " [local]".yellow() } else { "".normal() };
    println!(
        "{} {}{}  {} followers, {} engagement",
        id.dimmed(),
        name.bold(),
        tag,
        followers,
        engagement
    );
    if let Some(warning) = entity.get("warning").and_then(Value::as_str) {
        println!("  {}", warning.yellow());
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let client = DegradedClient::new(
        reqwest::Client::new(),
        &cli.gateway,
        &cli.viewer,
        FileKvStore::new(&cli.store_dir),
    );

    match cli.command {
        Command::Create {
            name,
            tone,
            background,
            mode,
            payload,
        } => {
            let payload = match payload {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| ClientError::Rejected {
                    status: 0,
                    message: format!("Invalid --payload JSON: {}", e),
                })?,
                None => json!({
                    "name": name,
                    "mode": mode,
                    "persona": { "tone": tone, "background": background },
                    "background_info": background,
                    "tone": tone,
                }),
            };
            let created = client.create_persona(&payload).await?;
            println!("{}", "Persona created".green());
            print_entity(&created);
        }
        Command::List => {
            let listing = client.list_personas().await?;
            if let Listing::Local(_) = listing {
                println!("{}", "Gateway unavailable; showing local personas".yellow());
            }
            if listing.entities().is_empty() {
                println!("{}", "No personas".dimmed());
            }
            for entity in listing.entities() {
                print_entity(entity);
            }
        }
        Command::Show { id } => match client.get_persona(&id).await? {
            Some(entity) => {
                print_entity(&entity);
                match serde_json::to_string_pretty(&entity) {
                    Ok(pretty) => println!("{}", pretty),
                    Err(e) => eprintln!("{}", e),
                }
            }
            None => println!("{}", format!("Persona {} not found", id).red()),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sorcerer_gateway=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".bold().red(), e);
        std::process::exit(1);
    }
}
