//! Service configuration.
//!
//! Every option has a flag and an environment variable; `.env` files are
//! loaded before parsing so either source works.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::scrapers::gold_provider::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

#[derive(Parser, Debug, Clone)]
#[command(name = "gold-prices")]
#[command(about = "Serves derived gold product prices as JSON")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Base URL of the price provider
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub upstream_base_url: String,

    /// Per-request upstream timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub upstream_timeout_secs: u64,

    /// How long a computed price list is served before refetching
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl_secs: u64,
}

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
