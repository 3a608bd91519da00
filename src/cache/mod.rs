//! Layer cache validity
//!
//! Decides whether a dependency layer from a previous build can be reused.
//!
//! # Strategies
//!
//! | Linking mode | Validity check | Metadata written |
//! |--------------|----------------|------------------|
//! | node_modules | SHA256 over `yarn.lock`, `package.json`, `yarn info` output and `NODE_ENV` | `cache_sha`, `built_at` |
//! | pnp | `.yarnrc.yml`, `.pnp.cjs` and the offline cache all present | none |
//!
//! Metadata is only written after an install succeeds, so a crashed build
//! never leaves a fingerprint behind for a half-populated layer.

pub mod fingerprint;
pub mod metadata;
pub mod oracle;

pub use fingerprint::Fingerprint;
pub use metadata::{keys, CacheMetadata};
pub use oracle::{CacheOracle, Decision};
