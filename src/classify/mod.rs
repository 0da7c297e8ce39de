// src/classify/mod.rs

//! Outcome classification.
//!
//! Both halves are pure functions with no IO:
//! - [`failure`] maps a retval plus diagnostic lines to a [`StatusLabel`].
//! - [`outcome`] turns one raw event into zero or one [`TaskOutcome`].

pub mod failure;
pub mod outcome;

pub use failure::{classify_failure, Reason, StatusLabel, FAILED_PATTERNS, UNREACHABLE_PATTERNS};
pub use outcome::{
    classify_event, TaskOutcome, GATHERING_FACTS_TASK, HIDE_ON_SUCCESS_MARKER, NO_HOSTS_MATCHED_TASK,
    NO_OUTPUT,
};
