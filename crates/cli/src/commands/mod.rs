//! Command implementations for the solgraph CLI
//!
//! `graph` turns a project into call graph JSON, `inspect` prints what the
//! parser sees in a single file, and `build-cache` pre-builds library graphs
//! that `graph --resolve-deps` can load instead of re-parsing libraries.

pub mod cache;
pub mod graph;
pub mod inspect;

use clap::ValueEnum;
use solgraph_core::PolicyKind;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum PolicyArg {
    Simple,
    Rich,
}

impl From<PolicyArg> for PolicyKind {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Simple => PolicyKind::Simple,
            PolicyArg::Rich => PolicyKind::Rich,
        }
    }
}
