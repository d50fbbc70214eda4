//! NodeStore integration tests
//!
//! This module tests value decomposition into records, incremental writes,
//! lookups and reconstruction through the public NodeStore API.

mod decomposition;
mod errors;
mod read;
