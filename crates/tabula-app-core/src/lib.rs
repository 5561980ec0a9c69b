// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Tabula tools (config, settings, toasts, guest tokens).
//! Keeps UI/runtime adapters thin and framework-agnostic.

pub mod config;
pub mod settings;
pub mod toast;
pub mod token_cache;
