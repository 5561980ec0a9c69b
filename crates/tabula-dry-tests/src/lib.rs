// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Tabula crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`scripted`] - Row store wrapper with call counting and injected failures
//! - [`fixtures`] - Demo base, tables, and column sets

pub mod config;
pub mod fixtures;
pub mod scripted;

pub use config::InMemoryConfigStore;
pub use scripted::{Gate, ScriptedStore};
