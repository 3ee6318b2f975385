mod common;

use anyhow::Result;
use axum::body::Bytes;
use axum::http::StatusCode;
use wedding_memory::storage::{cover_key, BlobStore};

#[tokio::test]
async fn cover_is_served_with_a_long_cache() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("cover@example.com").await?;
    let id = app.create_wedding(&token, "2031-06-06", "plan_c").await?;

    let none = app.get(&format!("/api/uploads/cover-image/{id}"), None).await?;
    assert_eq!(none.status, StatusCode::NOT_FOUND);

    let reply = app.upload_cover(&token, "image/webp", b"RIFF-webp").await?;
    assert_eq!(reply.status, StatusCode::OK);
    let url = reply.json()["cover_image_url"].as_str().unwrap_or_default().to_string();
    assert_eq!(url, format!("/api/uploads/cover-image/{id}"));

    let served = app.get(&url, None).await?;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.bytes, b"RIFF-webp");
    assert_eq!(served.headers["content-type"], "image/webp");
    assert_eq!(served.headers["cache-control"], "public, max-age=86400");

    let page = app.get(&format!("/api/weddings/{id}/public"), None).await?.json();
    assert_eq!(page["cover_image_url"], url.as_str());
    Ok(())
}

#[tokio::test]
async fn new_cover_replaces_the_old_one() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("twice@example.com").await?;
    let id = app.create_wedding(&token, "2031-06-06", "plan_a").await?;

    app.upload_cover(&token, "image/png", b"first").await?;
    app.upload_cover(&token, "image/jpeg", b"second").await?;

    let served = app.get(&format!("/api/uploads/cover-image/{id}"), None).await?;
    assert_eq!(served.bytes, b"second");
    assert_eq!(served.headers["content-type"], "image/jpeg");
    assert_eq!(app.blobs.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn cover_limits_are_enforced() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("limits@example.com").await?;
    app.create_wedding(&token, "2031-06-06", "plan_a").await?;

    let too_big = vec![0u8; 10 * 1024 * 1024 + 1];
    let reply = app.upload_cover(&token, "image/jpeg", &too_big).await?;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.error_kind(), "file_too_large");

    let heic = app.upload_cover(&token, "image/heic", b"heic").await?;
    assert_eq!(heic.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert_eq!(app.blobs.len().await, 0);
    Ok(())
}

#[tokio::test]
async fn cover_needs_an_event_first() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("early@example.com").await?;

    let reply = app.upload_cover(&token, "image/png", b"png").await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let anon = app.get("/api/uploads/cover-image/not-a-uuid", None).await?;
    assert_eq!(anon.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cover_content_type_comes_from_the_event_row() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("ctype@example.com").await?;
    let id = app.create_wedding(&token, "2031-06-06", "plan_b").await?;
    assert_eq!(app.upload_cover(&token, "image/png", b"png").await?.status, StatusCode::OK);

    // Blob metadata drifting from the row does not change what is served.
    app.blobs
        .put(&cover_key(id.parse()?), Bytes::from_static(b"png"), "application/octet-stream")
        .await?;

    let served = app.get(&format!("/api/uploads/cover-image/{id}"), None).await?;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.headers["content-type"], "image/png");
    Ok(())
}
