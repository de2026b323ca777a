//! # pf-core
//!
//! Core types, errors, and configuration for Portfolio RS.
//!
//! This crate provides the building blocks shared by the other crates:
//! - Common error types
//! - Entry identifiers and collection kinds
//! - Configuration types

pub mod config;
pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
