//! Configuration for Gatehouse
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Gatehouse - HTTP gateway for OCCI-style cloud resource descriptions
#[derive(Parser, Debug, Clone)]
#[command(name = "gatehouse")]
#[command(about = "HTTP gateway for OCCI-style cloud resource descriptions")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8090")]
    pub listen: SocketAddr,

    /// Public base URL used in canonical locations
    /// (e.g. "http://occi.example.org:8090"); derived from LISTEN if unset
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "gatehouse")]
    pub mongodb_db: String,

    /// Enable development mode (falls back to an in-memory store when
    /// MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Effective base URL for canonical locations, without a trailing
    /// slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.listen),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("BASE_URL must start with http:// or https://".to_string());
            }
        }
        if self.mongodb_db.is_empty() {
            return Err("MONGODB_DB must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            node_id: Uuid::nil(),
            listen: "127.0.0.1:8090".parse().unwrap(),
            base_url: None,
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "gatehouse".into(),
            dev_mode: true,
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_base_url_derived_from_listen() {
        assert_eq!(args().base_url(), "http://127.0.0.1:8090");
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let mut args = args();
        args.base_url = Some("http://occi.example.org/".into());
        assert_eq!(args.base_url(), "http://occi.example.org");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_schemeless_base_url() {
        let mut args = args();
        args.base_url = Some("occi.example.org".into());
        assert!(args.validate().is_err());
    }
}
