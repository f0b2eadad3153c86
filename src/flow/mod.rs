// SPDX-License-Identifier: MIT

pub mod config;
pub mod engine;
pub mod graph;
pub mod loader;
pub mod server;
pub mod session;
pub mod templates;
