use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::{config, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Log in and store the session token")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "PROTEK_PASSWORD", help = "Account password")]
        password: String,
    },

    #[command(about = "Show the account behind the stored token")]
    Whoami,

    #[command(about = "Forget the stored session token")]
    Logout,
}

pub async fn handle(
    cmd: AuthCommands,
    base_url: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    match cmd {
        AuthCommands::Login { email, password } => {
            let response = client
                .post(format!("{}/auth/login", base_url))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?;
            let status = response.status();
            let body: Value = response.json().await?;

            if !status.is_success() {
                let message = body
                    .pointer("/error")
                    .and_then(Value::as_str)
                    .unwrap_or("login failed");
                anyhow::bail!("{} ({})", message, status);
            }

            let token = body
                .pointer("/data/token")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("response carried no token"))?;

            let mut stored = config::load()?;
            stored.base_url = base_url.to_string();
            stored.token = Some(token.to_string());
            stored.email = Some(email.clone());
            config::save(&stored)?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => println!("Logged in as {}", email),
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let token = stored_token()?;
            let body: Value = client
                .get(format!("{}/api/account", base_url))
                .bearer_auth(&token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => {
                    let email = body
                        .pointer("/data/email")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    let role = body
                        .pointer("/data/role")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    println!("{} ({})", email, role);
                }
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let mut stored = config::load()?;
            stored.token = None;
            stored.email = None;
            config::save(&stored)?;
            println!("Session token cleared");
            Ok(())
        }
    }
}

pub fn stored_token() -> anyhow::Result<String> {
    config::load()?
        .token
        .ok_or_else(|| anyhow::anyhow!("not logged in, run `protek auth login` first"))
}
