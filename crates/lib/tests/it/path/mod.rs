//! Path algebra integration tests
//!
//! Tests parsing, child construction and the wildcard-aware relations that
//! subscription layers rely on.

mod matching;
mod variables;
