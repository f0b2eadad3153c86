// SPDX-License-Identifier: MIT

pub mod executor;
pub mod orchestrator;
pub mod types;

pub use executor::{ExecutionContext, NodeExecutor, NodeOutcome};
pub use orchestrator::FlowEngine;
pub use types::{
    ExecutionRun, ExecutionRunStatus, ModelPricing, NodeExecutionLog, NodeExecutionStatus,
    PricingTable,
};
