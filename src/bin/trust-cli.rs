use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "trust-cli")]
#[command(about = "Management CLI for the request-trust admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "REQUEST_TRUST_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Revoke a single access token by its jti
    Revoke {
        jti: String,
        /// Keep the revocation for this many seconds instead of the token lifetime
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Check whether a jti is revoked
    Check { jti: String },
    /// Invalidate every token issued to a principal so far
    Invalidate { principal: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match &cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Revoke { jti, ttl_secs } => client
            .post(format!("{base}/admin/tokens/revoke"))
            .json(&json!({ "jti": jti, "ttl_secs": ttl_secs })),
        Commands::Check { jti } => client.get(format!("{base}/admin/tokens/{jti}")),
        Commands::Invalidate { principal } => {
            client.post(format!("{base}/admin/principals/{principal}/invalidate"))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
