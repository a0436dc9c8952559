/*! Integration tests for currex.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - auth: registration and login through `AuthService`
 * - store: credential store implementations and their uniqueness guarantee
 * - currency: conversion over the static rate table
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("currex=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod auth;
mod currency;
mod helpers;
mod store;
