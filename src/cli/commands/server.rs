use clap::Subcommand;
use serde_json::Value;

use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health from the /health endpoint")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(
    cmd: ServerCommands,
    base_url: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    match cmd {
        ServerCommands::Health => {
            let response = client.get(format!("{}/health", base_url)).send().await?;
            let status = response.status();
            let body: Value = response.json().await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => {
                    let db = body
                        .pointer("/data/database")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    println!("server:   {}", base_url);
                    println!("status:   {}", status);
                    println!("database: {}", db);
                }
            }
            if !status.is_success() {
                anyhow::bail!("server reported {}", status);
            }
            Ok(())
        }
        ServerCommands::Info => {
            let body: Value = client
                .get(format!("{}/", base_url))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => {
                    let name = body
                        .pointer("/data/name")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    let version = body
                        .pointer("/data/version")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    println!("{} v{} at {}", name, version, base_url);
                    if let Some(endpoints) =
                        body.pointer("/data/endpoints").and_then(Value::as_object)
                    {
                        for (key, value) in endpoints {
                            println!("  {:10} {}", key, value.as_str().unwrap_or(""));
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
