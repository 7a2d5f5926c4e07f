use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use tabfetch::client::DecodedBody;
use tabfetch::config::load_config;
use tabfetch::{generate_key, ClientConfig, HttpResponse, RequestClient, RequestOptions};

#[derive(Parser)]
#[command(name = "tabfetch-cli")]
#[command(about = "Operational CLI for the tabfetch dataset client", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL through the full pipeline and print the decoded body
    Fetch {
        url: String,

        /// Bypass the response cache for this request
        #[arg(long)]
        no_cache: bool,

        /// Transport deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Retries after the initial attempt
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Print the canonical cache key for a URL and params
    Key {
        url: String,

        /// Request params as key=value; values parse as JSON, falling
        /// back to plain strings
        #[arg(short, long)]
        param: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    tabfetch::observability::logging::init(&config.observability.log_level);

    match cli.command {
        Commands::Fetch {
            url,
            no_cache,
            timeout_ms,
            retries,
        } => {
            let client = RequestClient::new(config);

            let mut options = RequestOptions::new();
            if no_cache {
                options = options.without_cache();
            }
            if let Some(timeout_ms) = timeout_ms {
                options = options.with_timeout_ms(timeout_ms);
            }
            if let Some(retries) = retries {
                options = options.with_retry_limit(retries);
            }

            let response = client.get(&url, options).await?;
            print_response(&response);
        }
        Commands::Key { url, param } => {
            let mut params = BTreeMap::new();
            for raw in param {
                let (key, value) = raw
                    .split_once('=')
                    .ok_or("params must be given as key=value")?;
                let value: Value = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                params.insert(key.to_string(), value);
            }
            println!("{}", generate_key(&url, &params));
        }
    }

    Ok(())
}

fn print_response(response: &HttpResponse) {
    match &response.body {
        DecodedBody::Json(value) => {
            let pretty =
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{}", pretty);
        }
        DecodedBody::Text(text) => println!("{}", text),
        DecodedBody::Binary(bytes) => println!("<{} bytes of binary data>", bytes.len()),
    }
    eprintln!(
        "status: {} | from_cache: {} | url: {}",
        response.status, response.from_cache, response.final_url
    );
}
