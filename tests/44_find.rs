mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn find_filters_and_orders() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    for (slug, published) in [("find-a", true), ("find-b", false), ("find-c", true)] {
        let res = client
            .post(format!("{}/api/pages", server.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "slug": format!("{}-{}", slug, server.port),
                "title": slug,
                "published": published
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let body: Value = client
        .post(format!("{}/api/find/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "select": ["slug", "published"],
            "where": {
                "published": true,
                "slug": { "$like": format!("find-%-{}", server.port) }
            },
            "order": "slug asc"
        }))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["success"], true);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Column subset means exactly the selected keys come back
    assert!(rows[0].get("slug").is_some());
    assert!(rows[0].get("title").is_none());
    assert!(rows[0]["slug"].as_str().unwrap().starts_with("find-a"));

    Ok(())
}

#[tokio::test]
async fn find_users_hides_credentials() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/find/users", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "where": { "email": "admin@protek.local" } }))
        .send()
        .await?
        .json()
        .await?;

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].get("password_digest").is_none());
    assert!(rows[0].get("password_salt").is_none());
    Ok(())
}

#[tokio::test]
async fn find_rejects_unknown_entities() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/find/pg_tables", server.base_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
