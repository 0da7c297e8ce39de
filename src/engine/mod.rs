// src/engine/mod.rs

//! Run execution.
//!
//! The pure core state machine lives in [`aggregator`]; the IO shell that
//! starts the event source and persists the result is [`runner`].

pub mod aggregator;
pub mod runner;

pub use aggregator::{RunAggregator, RunResult};
pub use runner::{Persistence, RunOptions, RunReport, Runner, RUN_START_FAILED};
