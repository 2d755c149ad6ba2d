//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory for relation files (legacy local-path configuration).
    pub data_dir: String,

    /// Optional fully-qualified data URI (e.g., `file:///var/skyline`, `memory://`).
    pub data_uri: Option<String>,

    /// Records per heap-file page.
    pub page_capacity: usize,

    /// Pages a sequential scan reads ahead. Advisory.
    pub buffer_pages: usize,

    /// Page compression: `none`, `zstd` or `lz4`.
    pub page_codec: String,

    /// Prefix for operator-private scratch relations.
    pub scratch_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "/tmp/skyline-data".to_string(),
            data_uri: None,
            page_capacity: 64,
            buffer_pages: 1,
            page_codec: "none".to_string(),
            scratch_prefix: "skyline_scratch".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub uri: Option<String>,
    pub root: String,
    pub page_capacity: usize,
    pub page_codec: String,
}

impl StorageConfig {
    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .and_then(|uri| uri.split("://").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SKYLINE_DATA_DIR`: root directory for relations
    /// - `SKYLINE_DATA_URI`: data URI (`file://...`, `memory://`)
    /// - `SKYLINE_PAGE_CAPACITY`: records per page
    /// - `SKYLINE_BUFFER_PAGES`: scan read-ahead in pages
    /// - `SKYLINE_PAGE_CODEC`: page compression
    /// - `SKYLINE_SCRATCH_PREFIX`: scratch relation prefix
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SKYLINE_DATA_DIR") {
            cfg.data_dir = s;
        }

        if let Ok(s) = std::env::var("SKYLINE_DATA_URI") {
            cfg.data_uri = Some(s);
        }

        if let Ok(s) = std::env::var("SKYLINE_PAGE_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.page_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("SKYLINE_BUFFER_PAGES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.buffer_pages = v;
            }
        }

        if let Ok(s) = std::env::var("SKYLINE_PAGE_CODEC") {
            cfg.page_codec = s;
        }

        if let Ok(s) = std::env::var("SKYLINE_SCRATCH_PREFIX") {
            cfg.scratch_prefix = s;
        }

        cfg
    }

    /// Parse a JSON config. Missing fields are an error.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_capacity == 0 || self.page_capacity > u16::MAX as usize {
            return Err(Error::Config(format!(
                "page_capacity must be in 1..={}, got {}",
                u16::MAX,
                self.page_capacity
            )));
        }
        if self.buffer_pages == 0 {
            return Err(Error::Config("buffer_pages must be at least 1".into()));
        }
        let prefix_ok = !self.scratch_prefix.is_empty()
            && self
                .scratch_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if !prefix_ok {
            return Err(Error::Config(format!(
                "invalid scratch_prefix '{}'",
                self.scratch_prefix
            )));
        }
        Ok(())
    }

    /// Produce a storage configuration snapshot used by the IO layer.
    pub fn storage_config(&self) -> StorageConfig {
        let scheme = self
            .data_uri
            .as_deref()
            .and_then(|uri| uri.split("://").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let root = match (scheme.as_deref(), self.data_uri.as_ref()) {
            (Some("file"), Some(uri)) => {
                file_uri_to_path(uri).unwrap_or_else(|| self.data_dir.clone())
            }
            (Some(_), Some(uri)) => uri.trim_end_matches('/').to_string(),
            _ => self.data_dir.clone(),
        };

        StorageConfig {
            uri: self.data_uri.clone(),
            root,
            page_capacity: self.page_capacity,
            page_codec: self.page_codec.clone(),
        }
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
