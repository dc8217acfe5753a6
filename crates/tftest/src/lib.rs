//! tftest: Terraform acceptance tests from annotated fixtures
//!
//! A fixture directory holds configuration fragments (`*.tf`). Comments in
//! each fragment say what the step expects, and an optional sibling JSON
//! snapshot holds the attribute values to compare against after apply.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  TestRunner                                                 │
//! │    ├── fixture_dirs(root) -> [dir]          (scan)          │
//! │    ├── load_case(dir) -> TestCase           (step)          │
//! │    │     ├── comments(fragment)             (lexer)         │
//! │    │     ├── DirectiveSet::extract          (directive)     │
//! │    │     └── Snapshot::load / checks        (snapshot)      │
//! │    └── CaseExecutor::execute(case)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TerraformExecutor                                          │
//! │    ├── init / apply / plan / show -json     (terraform)     │
//! │    ├── State::from_show_json                (state)         │
//! │    └── StepCheck::run(state)                (check)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Directives:
//!
//! ```hcl
//! # ExpectError: invalid size
//! # Check: dummy_resource.test
//! # Import: dummy_resource.test
//! resource "dummy_resource" "test" {}
//! ```
//!
//! Setting `TFTEST_REFRESH_STATE` rewrites every snapshot from live state
//! instead of asserting against it.

pub mod check;
pub mod config;
pub mod directive;
pub mod error;
pub mod ignore;
pub mod lexer;
pub mod runner;
pub mod scan;
pub mod snapshot;
pub mod state;
pub mod step;
pub mod terraform;

pub use check::{compose_aggregate, AttrCheck, StepCheck};
pub use config::{RunnerConfig, TerraformConfig, TestOptions, REFRESH_STATE_ENV};
pub use directive::{DirectiveKind, DirectiveSet};
pub use error::{Result, TfTestError};
pub use ignore::{default_ignore, default_ignore_change, IgnoreChange};
pub use runner::{CaseExecutor, TestResult, TestRunner, TestSuiteResult};
pub use scan::{find_fixtures, fixture_dirs};
pub use snapshot::{Snapshot, SET_SENTINEL};
pub use state::State;
pub use step::{load_case, load_test_step, load_test_steps, TestCase, TestStep};
pub use terraform::TerraformExecutor;
