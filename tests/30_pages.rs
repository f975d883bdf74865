mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn page_and_section_lifecycle() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let slug = format!("lifecycle-{}", server.port);
    let res = client
        .post(format!("{}/api/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "slug": slug, "title": "Delivery terms" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let page_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["lock_version"], 0);

    // Duplicate slug is a conflict
    let res = client
        .post(format!("{}/api/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "slug": slug, "title": "Again" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // A section without content gets the kind's default payload
    let res = client
        .post(format!("{}/api/pages/{}/sections", server.base_url, page_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "hero" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let hero: Value = res.json().await?;
    let hero_id = hero["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(hero["data"]["position"], 0);
    assert_eq!(hero["data"]["schema_version"], 2);
    assert!(hero["data"]["content"]["image"]["url"].is_string());

    let res = client
        .post(format!("{}/api/pages/{}/sections", server.base_url, page_id))
        .bearer_auth(&token)
        .json(&json!({
            "kind": "delivery",
            "content": {
                "heading": "Доставка",
                "options": [
                    { "name": "Курьер", "description": "По городу", "price_hint": "от 300 ₽" }
                ]
            }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let delivery: Value = res.json().await?;
    let delivery_id = delivery["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(delivery["data"]["position"], 1);

    // Malformed payload for the declared kind is rejected
    let res = client
        .post(format!("{}/api/pages/{}/sections", server.base_url, page_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "hero", "content": { "bogus": true } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Reorder with the current lock_version succeeds and bumps it
    let res = client
        .put(format!(
            "{}/api/pages/{}/sections/order",
            server.base_url, page_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "lock_version": 0, "section_ids": [delivery_id, hero_id] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let reordered: Value = res.json().await?;
    assert_eq!(reordered["data"]["lock_version"], 1);

    // Replaying the stale version is a conflict
    let res = client
        .put(format!(
            "{}/api/pages/{}/sections/order",
            server.base_url, page_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "lock_version": 0, "section_ids": [hero_id, delivery_id] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Sections come back in the new order
    let body: Value = client
        .get(format!("{}/api/pages/{}/sections", server.base_url, page_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["delivery", "hero"]);

    Ok(())
}

#[tokio::test]
async fn soft_delete_and_restore() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let slug = format!("restore-{}", server.port);
    let body: Value = client
        .post(format!("{}/api/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "slug": slug, "title": "Trash me" }))
        .send()
        .await?
        .json()
        .await?;
    let page_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .delete(format!("{}/api/pages/{}", server.base_url, page_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Gone from reads
    let res = client
        .get(format!("{}/api/pages/{}", server.base_url, page_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Restore brings it back
    let res = client
        .post(format!("{}/api/pages/{}/restore", server.base_url, page_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/pages/{}", server.base_url, page_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn renaming_onto_a_live_slug_is_a_conflict() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let first_slug = format!("rename-a-{}", server.port);
    let second_slug = format!("rename-b-{}", server.port);
    for (slug, title) in [(&first_slug, "First"), (&second_slug, "Second")] {
        let res = client
            .post(format!("{}/api/pages", server.base_url))
            .bearer_auth(&token)
            .json(&json!({ "slug": slug, "title": title }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let body: Value = client
        .get(format!(
            "{}/api/pages?limit=1000",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let second_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["slug"] == second_slug.as_str())
        .and_then(|p| p["id"].as_str())
        .unwrap()
        .to_string();

    // Taking another page's slug is a conflict, same as on create
    let res = client
        .put(format!("{}/api/pages/{}", server.base_url, second_id))
        .bearer_auth(&token)
        .json(&json!({ "slug": first_slug }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Re-submitting its own slug is not
    let res = client
        .put(format!("{}/api/pages/{}", server.base_url, second_id))
        .bearer_auth(&token)
        .json(&json!({ "slug": second_slug, "title": "Second, edited" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn stale_section_payload_upgrades_on_read() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let slug = format!("upgrade-{}", server.port);
    let body: Value = client
        .post(format!("{}/api/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "slug": slug, "title": "Main" }))
        .send()
        .await?
        .json()
        .await?;
    let page_id = body["data"]["id"].as_str().unwrap().to_string();

    let body: Value = client
        .post(format!("{}/api/pages/{}/sections", server.base_url, page_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "hero" }))
        .send()
        .await?
        .json()
        .await?;
    let section_id = body["data"]["id"].as_str().unwrap().to_string();

    // Rewrite the row to the old stored shape: image was a bare URL string
    let pool = sqlx::PgPool::connect(&std::env::var("DATABASE_URL")?).await?;
    sqlx::query("UPDATE page_sections SET schema_version = 1, content = $2 WHERE id = $1")
        .bind(uuid::Uuid::parse_str(&section_id)?)
        .bind(json!({
            "title": "Автозапчасти Протек",
            "subtitle": "Оригинал и аналоги",
            "image": "/img/old-hero.png"
        }))
        .execute(&pool)
        .await?;

    // Reads serve the current shape
    let body: Value = client
        .get(format!("{}/api/sections/{}", server.base_url, section_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["schema_version"], 2);
    assert_eq!(body["data"]["content"]["image"]["url"], "/img/old-hero.png");
    assert_eq!(body["data"]["content"]["image"]["alt"], "");

    // The stored row stays at v1; upgrades persist only on the next write
    let stored: i32 =
        sqlx::query_scalar("SELECT schema_version FROM page_sections WHERE id = $1")
            .bind(uuid::Uuid::parse_str(&section_id)?)
            .fetch_one(&pool)
            .await?;
    assert_eq!(stored, 1);

    Ok(())
}

#[tokio::test]
async fn invalid_slug_is_rejected() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/pages", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "slug": "Bad Slug!", "title": "X" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
