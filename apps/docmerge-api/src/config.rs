//! Service configuration loaded from the environment

use anyhow::{anyhow, Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Where template records and blobs live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted Supabase project (PostgREST + Storage)
    Supabase { url: String, service_role_key: String },
    /// SQLite template table plus a directory per bucket
    Local {
        database_url: String,
        storage_root: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub backend: StoreBackend,
    pub templates_table: String,
    pub template_bucket: String,
    pub output_bucket: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - PORT, HOST: listen address (default 0.0.0.0:3001)
    /// - STORE_BACKEND: "supabase" or "local" (default: supabase when
    ///   SUPABASE_URL is set, local otherwise)
    /// - SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY: required for supabase
    /// - DATABASE_URL, STORAGE_ROOT: local backend locations
    /// - TEMPLATES_TABLE, TEMPLATE_BUCKET, OUTPUT_BUCKET: names
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("Invalid PORT: {}", p))?,
            None => 3001,
        };
        let host = match var("HOST") {
            Some(h) => h.trim().parse().with_context(|| format!("Invalid HOST: {}", h))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let backend_name = var("STORE_BACKEND").unwrap_or_else(|| {
            if var("SUPABASE_URL").is_some() {
                "supabase".to_string()
            } else {
                "local".to_string()
            }
        });

        let backend = match backend_name.to_lowercase().as_str() {
            "supabase" => StoreBackend::Supabase {
                url: var("SUPABASE_URL")
                    .ok_or_else(|| anyhow!("SUPABASE_URL is required for the supabase backend"))?,
                service_role_key: var("SUPABASE_SERVICE_ROLE_KEY").ok_or_else(|| {
                    anyhow!("SUPABASE_SERVICE_ROLE_KEY is required for the supabase backend")
                })?,
            },
            "local" => StoreBackend::Local {
                database_url: var("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:./data/docmerge.db?mode=rwc".to_string()),
                storage_root: var("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./storage")),
            },
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        Ok(Self {
            host,
            port,
            backend,
            templates_table: var("TEMPLATES_TABLE")
                .unwrap_or_else(|| "document_templates".to_string()),
            template_bucket: var("TEMPLATE_BUCKET").unwrap_or_else(|| "templates".to_string()),
            output_bucket: var("OUTPUT_BUCKET")
                .unwrap_or_else(|| "documentos-assinados".to_string()),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
