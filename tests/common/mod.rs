#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use wedding_memory::config::AppConfig;
use wedding_memory::jwt::JwtConfig;
use wedding_memory::storage::MemoryBlobStore;
use wedding_memory::utils::{hash_password, utc_now};
use wedding_memory::{build_router, db, AppState};

pub const BOUNDARY: &str = "wedding-memory-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub blobs: Arc<MemoryBlobStore>,
    _dir: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn error_kind(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }
}

pub async fn spawn() -> Result<TestApp> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    // run migrations from crate migrations folder
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    let blobs = Arc::new(MemoryBlobStore::new());
    let config = AppConfig::new(8000, dir.path().join("blobs"), "http://guests.example.com");
    let state = AppState::new(pool.clone(), JwtConfig::new("test-secret", 24), blobs.clone(), config);

    Ok(TestApp {
        router: build_router(state),
        pool,
        blobs,
        _dir: dir,
    })
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Result<Reply> {
        let resp: Response = self.router.clone().oneshot(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = body::to_bytes(resp.into_body(), 64 * 1024 * 1024).await?.to_vec();
        Ok(Reply { status, headers, bytes })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<Reply> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        self.send(req.body(Body::empty())?).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<Reply> {
        let req = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())?;
        self.send(req).await
    }

    pub async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> Result<Reply> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        self.send(req.body(Body::from(body.to_string()))?).await
    }

    /// Registers an owner and returns `(token, user_id)`.
    pub async fn register_owner(&self, email: &str) -> Result<(String, String)> {
        let reply = self
            .json(
                "POST",
                "/api/auth/register",
                None,
                json!({ "name": "Owner", "email": email, "password": "password123" }),
            )
            .await?;
        if reply.status != StatusCode::CREATED {
            panic!("register failed: {} - {}", reply.status, String::from_utf8_lossy(&reply.bytes));
        }
        let v = reply.json();
        let token = v["token"].as_str().context("missing token")?.to_string();
        let user_id = v["user"]["id"].as_str().context("missing user id")?.to_string();
        Ok((token, user_id))
    }

    /// Seeds a super admin the way `wedding-cli create-superadmin` does, then logs in.
    pub async fn super_admin_token(&self) -> Result<String> {
        let hash = hash_password("superpassword")?;
        db::users::upsert_super_admin(&self.pool, "root@example.com", "Root", &hash, utc_now()).await?;

        let reply = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "root@example.com", "password": "superpassword" }),
            )
            .await?;
        assert_eq!(reply.status, StatusCode::OK, "super admin login failed");
        Ok(reply.json()["token"].as_str().context("missing token")?.to_string())
    }

    /// Creates the owner's wedding and returns its id.
    pub async fn create_wedding(&self, token: &str, wedding_date: &str, plan_id: &str) -> Result<String> {
        let reply = self
            .json(
                "POST",
                "/api/weddings",
                Some(token),
                json!({
                    "bride_name": "Minji",
                    "groom_name": "Junho",
                    "wedding_date": wedding_date,
                    "wedding_time": "13:00",
                    "venue_name": "Grand Hall",
                    "contact_email": "couple@example.com",
                    "plan_id": plan_id
                }),
            )
            .await?;
        if reply.status != StatusCode::OK {
            panic!("wedding save failed: {} - {}", reply.status, String::from_utf8_lossy(&reply.bytes));
        }
        Ok(reply.json()["wedding"]["id"].as_str().context("missing wedding id")?.to_string())
    }

    pub async fn guest_upload(&self, wedding_id: &str, guest_name: &str, mime: &str, bytes: &[u8]) -> Result<Reply> {
        let req = Request::builder()
            .method("POST")
            .uri(format!("/api/uploads/guest/{}", wedding_id))
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .header("x-guest-name", HeaderValue::from_bytes(guest_name.as_bytes())?)
            .header("user-agent", "Mozilla/5.0 (iPhone) Mobile/15E148")
            .body(Body::from(multipart_file("photo.bin", mime, bytes)))?;
        self.send(req).await
    }

    pub async fn upload_cover(&self, token: &str, mime: &str, bytes: &[u8]) -> Result<Reply> {
        let req = Request::builder()
            .method("POST")
            .uri("/api/uploads/cover")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from(multipart_file("cover.bin", mime, bytes)))?;
        self.send(req).await
    }

    pub async fn count(&self, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await?)
    }
}

/// A single-field multipart body carrying `file`.
pub fn multipart_file(file_name: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
