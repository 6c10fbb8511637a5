use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Query CLI for the media relay catalog", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search {
        /// Title substring
        #[arg(short, long)]
        q: Option<String>,
        /// Category name
        #[arg(short, long)]
        cat: Option<String>,
        /// Shuffle results
        #[arg(short, long)]
        random: bool,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List categories with record counts
    Categories,
    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Search { q, cat, random, offset, limit } => {
            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(q) = q {
                params.push(("q", q));
            }
            if let Some(cat) = cat {
                params.push(("cat", cat));
            }
            if random {
                params.push(("random", "true".to_string()));
            }
            if let Some(offset) = offset {
                params.push(("offset", offset.to_string()));
            }
            if let Some(limit) = limit {
                params.push(("limit", limit.to_string()));
            }
            client.get(format!("{base}/api/movies")).query(&params).send().await?
        }
        Commands::Categories => client.get(format!("{base}/api/categories")).send().await?,
        Commands::Health => client.get(format!("{base}/health")).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
