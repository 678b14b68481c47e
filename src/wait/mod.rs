/*!
 * Wait Module
 * Wait specifications, the blocking primitive, status records, and the
 * exactly-once reap transaction
 */

pub mod blocker;
pub mod reaper;
pub mod status;
pub mod types;

pub use blocker::WaitBlocker;
pub use status::{StatusCode, StatusRecord};
pub use types::{
    ChildSelector, WaitError, WaitEvent, WaitOptions, WaitOutcome, WaitResult, WaitSpecification,
    WaitTarget, P_ALL, P_PGID, P_PID,
};
