//! Rules module - Benchmark checks and their evaluation engine

pub mod check;
pub mod compare;
pub(crate) mod de;
pub mod engine;
pub mod extract;
pub mod jsonpath;
pub mod results;
pub mod test_item;
pub mod test_set;

pub use check::{Check, CheckOutcome, CheckType, ProbeOutputs, State};
pub use compare::{compare, CompareOp, Comparison};
pub use engine::{RulesEngine, RunFilter};
pub use extract::{extract, DocumentFormat, ExtractMode, Extracted};
pub use results::{AuditResults, CheckResult, ControlsReport, GroupResult, Summary};
pub use test_item::{Compare, ProbeSource, TestItem, TestOutcome};
pub use test_set::{BinOp, TestSet};
