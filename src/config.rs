use clap::Parser;
use crate::error::GatewayError;

pub const DEFAULT_UPSTREAM: &str = "https://601f1754b5a0e9001706a292.mockapi.io";

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "podcast-gateway")]
#[command(about = "Rate limited reverse proxy for the podcast service")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // Upstream podcast service base url
    // Example: "https://601f1754b5a0e9001706a292.mockapi.io"
    #[arg(short, long, default_value = DEFAULT_UPSTREAM)]
    pub upstream: String,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // "<upstream>/podcasts", trailing slash on the base tolerated
    pub fn podcasts_url(&self) -> Result<reqwest::Url, GatewayError> {
        let base = self.upstream.trim_end_matches('/');
        reqwest::Url::parse(&format!("{}/podcasts", base)).map_err(|source| {
            GatewayError::InvalidUpstream {
                upstream: self.upstream.clone(),
                source,
            }
        })
    }
}
