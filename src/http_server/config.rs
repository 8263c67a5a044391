//! Listener settings: bind address, CORS origins and the body limit.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// The `server` section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Interface IP, v4 or v6
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes; bounds uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    54321
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl HttpServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Address to bind; `host` must be an IP literal
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// CORS layer for the configured origins. Unparseable origins are skipped.
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origins.is_empty() {
            return layer.allow_origin(Any);
        }

        let origins: Vec<_> = self
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpServerConfig::default();
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:54321");
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.max_upload_bytes, 52428800);
    }

    #[test]
    fn test_ipv6_bind_addr() {
        let config = HttpServerConfig {
            host: "::1".to_string(),
            ..Default::default()
        }
        .with_port(8080);
        assert_eq!(config.bind_addr().unwrap().to_string(), "[::1]:8080");
    }

    #[test]
    fn test_hostname_is_not_an_address() {
        let config = HttpServerConfig {
            host: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
    }
}
