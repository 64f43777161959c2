use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mirror-cli")]
#[command(about = "Cache management CLI for mirror-proxy", long_about = None)]
struct Cli {
    /// Base URL of the running mirror
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Cache clear token (required by info and clear)
    #[arg(short, long, env = "CACHE_CLEAR_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cache size, limits and strategy
    Info,
    /// Drop every cached entry
    Clear,
    /// List cached entries
    Stats,
    /// Check the mirror is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let path = match cli.command {
        Commands::Info => "/cache/info",
        Commands::Clear => "/cache/clear",
        Commands::Stats => "/cache/stats",
        Commands::Health => "/health",
    };

    let mut request = client.get(format!("{}{}", base, path));
    if let Some(token) = &cli.token {
        request = request.query(&[("token", token)]);
    }

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: mirror returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
