//! Test harness for scripting and verifying carriage assemblies.
//!
//! # Key Components
//!
//! - [`AssemblyBuilder`]: Fluent API for placing and detaching named parts
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`report`]: Structured text assembly descriptions
//! - [`fixtures`]: A carriage base and a matching attachment for each slot
//! - [`helpers`]: Descriptor builders and the harness error type

pub mod fixtures;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::{DescriptorBuilder, HarnessError};
pub use oracle::OracleVerdict;
pub use report::AssemblyReport;
pub use workflow::AssemblyBuilder;
