//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → passed explicitly into RequestClient::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a client keeps its config for life
//! - All fields have defaults to allow minimal configs
//! - No process-wide mutable default: callers that want a shared
//!   configuration construct one and pass it around

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::{CacheConfig, RateLimitConfig, RetryConfig, TimeoutConfig};
