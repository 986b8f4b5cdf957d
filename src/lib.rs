//! teambalance: ranked-game stat collector and team balancer
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod skill;
pub mod balance;
pub mod provider;
pub mod engine;
pub mod storage;
pub mod server;
