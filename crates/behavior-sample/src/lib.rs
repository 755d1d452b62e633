//! # Behavior Sample Library
//!
//! This library exposes the sample's modules for the binary and for integration testing.

pub mod account_actor;
pub mod clients;
pub mod lifecycle;
pub mod model;
pub mod stats_actor;
