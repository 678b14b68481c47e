/*!
 * procwait Kernel Core
 * Wait-and-reap synchronization: blocking a thread until a designated
 * child changes state, and harvesting terminated processes exactly once
 */

pub mod core;
pub mod memory;
pub mod process;
pub mod signals;
pub mod syscalls;
pub mod wait;

// Re-exports
pub use memory::{Protection, UserMemory};
pub use process::{ExitStatus, ProcessTable, ThreadState};
pub use signals::Signal;
pub use syscalls::{Errno, SyscallExecutor, WaitidParams};
pub use wait::{
    ChildSelector, StatusCode, StatusRecord, WaitBlocker, WaitError, WaitOptions, WaitOutcome,
    WaitSpecification, WaitTarget, P_ALL, P_PGID, P_PID,
};
