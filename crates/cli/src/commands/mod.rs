//! Subcommand implementations. Each takes the repositories so it can run
//! against the in-memory store in tests.

pub mod orders;
pub mod products;
pub mod seed;
