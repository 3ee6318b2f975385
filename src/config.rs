use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Root directory of the filesystem blob store.
    pub blob_storage_dir: PathBuf,
    /// Origin guests open; share links are built from it.
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let port = port_from_env();

        let blob_storage_dir = std::env::var("BLOB_STORAGE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AppError::configuration("BLOB_STORAGE_DIR must be set"))?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self::new(port, blob_storage_dir, public_base_url))
    }

    pub fn new(port: u16, blob_storage_dir: PathBuf, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            port,
            blob_storage_dir,
            public_base_url,
        }
    }

    /// Guest-facing page for an event; the QR code encodes this.
    pub fn share_url(&self, wedding_id: uuid::Uuid) -> String {
        format!("{}/wedding/{}", self.public_base_url, wedding_id)
    }
}

pub fn port_from_env() -> u16 {
    std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_ignores_trailing_slash() {
        let config = AppConfig::new(8000, PathBuf::from("/tmp/blobs"), "https://photos.example.com/");
        let id = uuid::Uuid::nil();
        assert_eq!(
            config.share_url(id),
            "https://photos.example.com/wedding/00000000-0000-0000-0000-000000000000"
        );
    }
}
