use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "provision-cli")]
#[command(about = "Management CLI for the xray provisioner", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new client and print its link
    Add {
        /// Name shown in the client's app
        config_name: String,
        /// Use this identifier instead of a generated UUID
        #[arg(long)]
        id: Option<String>,
        /// Target transport (defaults to the server's configured one)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Remove one client from every inbound
    Remove { id: String },
    /// Remove several clients with a single reload
    Disconnect { ids: Vec<String> },
    /// Take clients offline
    Deactivate { ids: Vec<String> },
    /// Restore previously deactivated clients
    Reactivate { ids: Vec<String> },
    /// List every provisioned identifier
    List,
    /// Count clients under a transport
    Count {
        #[arg(long)]
        transport: Option<String>,
    },
    /// Print the link of an existing client
    Link { id: String, config_name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Add { config_name, id, transport } => {
            client
                .post(format!("{}/clients", base))
                .json(&json!({ "config_name": config_name, "identifier": id, "transport": transport }))
                .send()
                .await?
        }
        Commands::Remove { id } => client.delete(format!("{}/clients/{}", base, id)).send().await?,
        Commands::Disconnect { ids } => batch(&client, base, "disconnect", ids).await?,
        Commands::Deactivate { ids } => batch(&client, base, "deactivate", ids).await?,
        Commands::Reactivate { ids } => batch(&client, base, "reactivate", ids).await?,
        Commands::List => client.get(format!("{}/clients", base)).send().await?,
        Commands::Count { transport } => {
            let mut req = client.get(format!("{}/clients/count", base));
            if let Some(transport) = transport {
                req = req.query(&[("transport", transport)]);
            }
            req.send().await?
        }
        Commands::Link { id, config_name } => {
            client
                .get(format!("{}/clients/{}/link", base, id))
                .query(&[("config_name", config_name)])
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn batch(
    client: &reqwest::Client,
    base: &str,
    action: &str,
    ids: Vec<String>,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .post(format!("{}/clients/{}", base, action))
        .json(&json!({ "identifiers": ids }))
        .send()
        .await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("OK");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
