//! Configuration structs for the treefig demo application.
//!
//! A small service config touching every unit-suffixed scalar treefig
//! understands. A matching file looks like:
//!
//! ```toml
//! name = "edge-cache"
//! maintenance = "off"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! timeout = "30s"
//!
//! [cache]
//! capacity = "512MiB"
//! retention = "2w"
//! backend = "memory"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use treefig::{MemorySize, Period};

/// Root configuration for the demo application.
#[derive(Serialize, Deserialize, Debug)]
pub struct DemoConfig {
    pub name: String,

    /// Accepts `yes`/`no` and `on`/`off` as well as plain booleans.
    #[serde(with = "treefig::lenient_bool")]
    pub maintenance: bool,

    pub server: ServerConfig,
    pub cache: CacheConfig,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(with = "treefig::duration")]
    pub timeout: Duration,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CacheConfig {
    pub capacity: MemorySize,
    pub retention: Period,
    pub backend: Backend,
}

/// `"memory"`, or `{disk = {path = "..."}}`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Disk { path: String },
}
