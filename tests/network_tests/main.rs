//! Network tests: pool, server and connection lifecycle

#[path = "../common/mod.rs"]
mod common;

mod pool_tests;
