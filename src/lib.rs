// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod kubernetes;
pub mod metrics;
pub mod reconcilers;
pub mod types;
pub mod upgrade;

#[cfg(test)]
pub mod test_utils;
