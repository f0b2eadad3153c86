// SPDX-License-Identifier: MIT

//! kinetic-flow: dependency-ordered execution of node-based LLM flows

pub mod adk;
pub mod flow;
