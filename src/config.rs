use std::{path::PathBuf, time::Duration};

use clap::Parser;
use http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

pub const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:8000", "http://localhost:3000"];

#[derive(Parser, Debug, Clone)]
#[command(name = "blog-api")]
#[command(about = "Markdown article JSON API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ServerConfig {
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory whose subdirectories each hold one article's `index.md`
    #[arg(long, env = "ARTICLES_DIR", default_value = "/app/articles")]
    pub articles_dir: PathBuf,

    /// Extra origin allowed by CORS, e.g. the frontend's public URL
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        DEFAULT_ORIGINS
            .iter()
            .map(|origin| origin.to_string())
            .chain(self.frontend_url.clone().filter(|url| !url.is_empty()))
            .collect()
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins()
            .into_iter()
            .filter_map(|origin| match HeaderValue::from_str(&origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid CORS origin '{origin}'");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers([header::LINK])
            .allow_credentials(false)
            .max_age(Duration::from_secs(300))
    }
}
