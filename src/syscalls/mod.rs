/*!
 * Syscalls Module
 * ABI types and the waitid entry point
 */

pub mod types;
pub mod wait;

pub use types::{Errno, WaitidParams, WAITID_PARAMS_BYTES};
pub use wait::SyscallExecutor;
