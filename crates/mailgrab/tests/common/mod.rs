//! Shared test utilities for mailgrab integration tests.
//!
//! `IngestHarness` wires a config, temp directories, and a scripted
//! transport standing in for Graph and the token endpoint.

pub mod harness;

pub use harness::IngestHarness;
