//! Core domain types
//!
//! These types describe work as the worker sees it: a job activated by the
//! broker, the variables a handler hands back, and the single outcome that is
//! reported for every job.

pub mod job;
pub mod outcome;
pub mod task_type;

pub use job::{HandlerResult, Job, JobKey, Variables};
pub use outcome::{JobOutcome, JobState};
pub use task_type::TaskType;
