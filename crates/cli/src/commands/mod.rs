//! CLI Commands

pub mod check;
pub mod lint;
pub mod list;
pub mod run;
