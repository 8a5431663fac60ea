use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Command-line client for the action proxy", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PROXY_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the proxy is up
    Health,
    /// Log in with mobile number and password
    Login {
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        password: String,
    },
    /// Invoke an upstream action
    Call {
        action: String,
        /// JSON object sent as the action payload
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// Upload an image file to the asset host
    Upload {
        file: PathBuf,
        /// Name to store under; defaults to the file name
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Login { mobile, password } => {
            let res = client
                .post(format!("{}/login", base))
                .json(&json!({ "mobile": mobile, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Call { action, data } => {
            let payload: Map<String, Value> = serde_json::from_str(&data)
                .map_err(|e| format!("--data must be a JSON object: {}", e))?;
            let res = client
                .post(format!("{}/api/{}", base, action))
                .json(&payload)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Upload { file, name } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or("cannot derive a file name; pass --name")?,
            };
            let res = client
                .post(format!("{}/upload-image", base))
                .json(&json!({ "image": STANDARD.encode(bytes), "fileName": file_name }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    println!("{}", render_reply(status, text)?);
    Ok(())
}

/// Pretty-print JSON replies. A non-2xx status becomes an error carrying the
/// body, so the process exits non-zero.
fn render_reply(status: StatusCode, text: String) -> Result<String, String> {
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(text),
        Err(_) => text,
    };

    if status.is_success() {
        Ok(rendered)
    } else {
        Err(format!("proxy returned status {}\n{}", status, rendered))
    }
}
