//! Value diff integration tests
//!
//! Tests comparison verdicts and the mutation lists change subscribers
//! receive.

mod compare;
