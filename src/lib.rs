//! Yum Extender core: queue package actions and drive transactions through
//! the DNF system daemon.

pub mod args;
pub mod backend;
pub mod config;
pub mod frontend;
pub mod lifecycle;
pub mod presence;
pub mod queue;
pub mod session;
pub mod transaction;
pub mod util;

#[cfg(test)]
mod test_utils;
