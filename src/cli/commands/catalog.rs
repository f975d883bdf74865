use std::path::PathBuf;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::commands::auth::stored_token;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum CatalogCommands {
    #[command(about = "Export categories and products as JSON")]
    Export {
        #[arg(long, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    #[command(about = "Import categories and products from a JSON export")]
    Import {
        #[arg(help = "Path to a JSON file produced by `protek catalog export`")]
        file: PathBuf,
    },
}

const EXPORT_QUERY: &str = r#"
{
  categories { id slug name parentId position }
  products(limit: 1000) {
    total
    items { id categoryId sku name brand price stock attrs }
  }
}
"#;

pub async fn handle(
    cmd: CatalogCommands,
    base_url: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let token = stored_token()?;

    match cmd {
        CatalogCommands::Export { output } => {
            let body = graphql(&client, base_url, &token, EXPORT_QUERY, None).await?;
            let export = json!({
                "categories": body.pointer("/data/categories").cloned().unwrap_or(json!([])),
                "products": body.pointer("/data/products/items").cloned().unwrap_or(json!([])),
            });
            let rendered = serde_json::to_string_pretty(&export)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)?;
                    if matches!(output_format, OutputFormat::Text) {
                        println!("Wrote export to {}", path.display());
                    }
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }
        CatalogCommands::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let export: Value = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("malformed export {}: {}", file.display(), e))?;

            let categories = export
                .pointer("/categories")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let products = export
                .pointer("/products")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let mut created_categories = 0usize;
            for category in &categories {
                let query = "mutation($input: CreateCategoryInput!) { \
                             createCategory(input: $input) { id } }";
                let variables = json!({
                    "input": {
                        "slug": category.pointer("/slug"),
                        "name": category.pointer("/name"),
                        "parentId": category.pointer("/parentId"),
                        "position": category.pointer("/position").cloned().unwrap_or(json!(0)),
                    }
                });
                graphql(&client, base_url, &token, query, Some(variables)).await?;
                created_categories += 1;
            }

            let mut created_products = 0usize;
            for product in &products {
                let query = "mutation($input: CreateProductInput!) { \
                             createProduct(input: $input) { id } }";
                let variables = json!({
                    "input": {
                        "categoryId": product.pointer("/categoryId"),
                        "sku": product.pointer("/sku"),
                        "name": product.pointer("/name"),
                        "brand": product.pointer("/brand").cloned().unwrap_or(json!("")),
                        "price": product.pointer("/price"),
                        "stock": product.pointer("/stock").cloned().unwrap_or(json!(0)),
                        "attrs": product.pointer("/attrs"),
                    }
                });
                graphql(&client, base_url, &token, query, Some(variables)).await?;
                created_products += 1;
            }

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "categories": created_categories, "products": created_products })
                ),
                OutputFormat::Text => println!(
                    "Imported {} categories and {} products",
                    created_categories, created_products
                ),
            }
            Ok(())
        }
    }
}

async fn graphql(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    query: &str,
    variables: Option<Value>,
) -> anyhow::Result<Value> {
    let mut payload = json!({ "query": query });
    if let Some(variables) = variables {
        payload["variables"] = variables;
    }

    let body: Value = client
        .post(format!("{}/api/graphql", base_url))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let first = errors[0]
                .pointer("/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error");
            anyhow::bail!("GraphQL error: {}", first);
        }
    }
    Ok(body)
}
