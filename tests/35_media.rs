mod common;

use anyhow::Result;
use reqwest::multipart;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn upload_fetch_and_delete_an_asset() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let payload = b"fake png bytes".to_vec();
    let form = multipart::Form::new()
        .part(
            "file",
            multipart::Part::bytes(payload.clone())
                .file_name("hero.png")
                .mime_str("image/png")?,
        )
        .text("alt", "Hero banner");

    let res = client
        .post(format!("{}/api/media", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let asset_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["file_name"], "hero.png");
    assert_eq!(body["data"]["byte_size"], payload.len() as i64);
    assert_eq!(body["data"]["alt"], "Hero banner");

    // Raw bytes round-trip with the stored content type
    let res = client
        .get(format!("{}/api/media/{}/raw", server.base_url, asset_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap().to_str()?,
        "image/png"
    );
    assert_eq!(res.bytes().await?.to_vec(), payload);

    let res = client
        .delete(format!("{}/api/media/{}", server.base_url, asset_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/media/{}", server.base_url, asset_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn upload_larger_than_the_stock_body_cap_succeeds() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    // 3 MB: above axum's stock 2 MB body limit, well under the configured cap
    let payload = vec![0xA5u8; 3 * 1024 * 1024];
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(payload.clone())
            .file_name("catalog-scan.pdf")
            .mime_str("application/pdf")?,
    );

    let res = client
        .post(format!("{}/api/media", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["byte_size"], payload.len() as i64);

    // Clean up the stored bytes
    let asset_id = body["data"]["id"].as_str().unwrap().to_string();
    client
        .delete(format!("{}/api/media/{}", server.base_url, asset_id))
        .bearer_auth(&token)
        .send()
        .await?;

    Ok(())
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let token = common::admin_token(&server.base_url).await?;
    let client = reqwest::Client::new();

    let form = multipart::Form::new().text("alt", "no file here");
    let res = client
        .post(format!("{}/api/media", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
