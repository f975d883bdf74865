mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn graphql(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    query: &str,
    variables: Value,
) -> Result<Value> {
    let res = client
        .post(format!("{}/api/graphql", base_url))
        .bearer_auth(token)
        .json(&json!({ "query": query, "variables": variables }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "status {}", res.status());
    Ok(res.json().await?)
}

#[tokio::test]
async fn catalog_crud_over_graphql() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "mutation($input: CreateCategoryInput!) { createCategory(input: $input) { id slug } }",
        json!({ "input": { "slug": format!("brakes-{}", server.port), "name": "Тормозная система" } }),
    )
    .await?;
    assert!(body.get("errors").is_none(), "errors: {:?}", body.get("errors"));
    let category_id = body["data"]["createCategory"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "mutation($input: CreateProductInput!) { createProduct(input: $input) { id sku stock } }",
        json!({ "input": {
            "categoryId": category_id,
            "sku": format!("BP-{}", server.port),
            "name": "Колодки тормозные передние",
            "brand": "Bosch",
            "price": "2490.00",
            "stock": 12,
            "attrs": { "oem": ["0 986 494 104"] }
        }}),
    )
    .await?;
    assert!(body.get("errors").is_none(), "errors: {:?}", body.get("errors"));
    let product_id = body["data"]["createProduct"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Search by brand substring scoped to the category
    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "query($cat: UUID!) { products(search: \"Bosch\", categoryId: $cat) { total items { sku brand } } }",
        json!({ "cat": category_id }),
    )
    .await?;
    assert_eq!(body["data"]["products"]["total"], 1);
    assert_eq!(body["data"]["products"]["items"][0]["brand"], "Bosch");

    // Category with live products refuses deletion
    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "mutation($id: UUID!) { deleteCategory(id: $id) }",
        json!({ "id": category_id }),
    )
    .await?;
    assert!(body["errors"].is_array());

    // Delete the product, then the category goes through
    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "mutation($id: UUID!) { deleteProduct(id: $id) }",
        json!({ "id": product_id }),
    )
    .await?;
    assert_eq!(body["data"]["deleteProduct"], true);

    let body = graphql(
        &client,
        &server.base_url,
        &token,
        "mutation($id: UUID!) { deleteCategory(id: $id) }",
        json!({ "id": category_id }),
    )
    .await?;
    assert_eq!(body["data"]["deleteCategory"], true);

    Ok(())
}

#[tokio::test]
async fn graphql_requires_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/graphql", server.base_url))
        .json(&json!({ "query": "{ categories { id } }" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn playground_is_served_without_a_token_in_development() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // GET serves the browser playground; only POST requires a bearer token
    let res = client
        .get(format!("{}/api/graphql", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await?.contains("GraphQL Playground"));
    Ok(())
}
