/*!
 * Memory Module
 * Untrusted user memory: per-process address spaces with validate/copy
 * services used by the syscall layer
 */

pub mod types;
pub mod user;

pub use types::{MemoryError, MemoryResult, Protection};
pub use user::UserMemory;
