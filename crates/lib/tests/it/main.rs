/*! Integration tests for Tessera.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - path: Tests for path parsing, wildcard matching and variables
 * - diff: Tests for value comparison and mutation flattening
 * - node: Tests for the NodeStore write, read, delete and export operations
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tessera=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod diff;
mod node;
mod path;
