//! Shell Registry - supported shells and how to drive them

mod config;

pub use config::*;
