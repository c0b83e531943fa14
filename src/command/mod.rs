//! Request execution pipeline
//!
//! Converts a ParsedRequest into file operations:
//! ParsedRequest -> PlanBuilder -> Plan -> Dispatcher -> ExecutionResult -> report

pub mod executor;
pub mod planner;
pub mod report;

pub use executor::{Dispatcher, ExecutionResult, OrganizeOutcome, SearchOutcome};
pub use planner::{DirectoryResolver, Plan, PlanBuilder};
pub use report::format_response;
