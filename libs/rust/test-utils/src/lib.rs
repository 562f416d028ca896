//! Shared test utilities for keyvault-lookup.
//!
//! This crate provides:
//! - A scripted HTTP transport and a recording lookup context
//! - Proptest generators for keys and wire values
//! - Vault set and response fixtures

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{MockReply, MockTransport, RecordingContext};
