/*!
 * Process Module
 * Process descriptors, the lock-guarded registry, and lifecycle transitions
 */

pub mod lifecycle;
pub mod table;
pub mod types;

pub use table::ProcessTable;
pub use types::{
    ExitStatus, ProcessDescriptor, ProcessError, ProcessResult, ProcessSnapshot, ThreadDescriptor,
    ThreadState,
};
