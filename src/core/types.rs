/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Thread ID type (the main thread of a process has tid == pid)
pub type Tid = u32;

/// User ID type (process credentials)
pub type Uid = u32;

/// Address type for user memory operations
pub type Address = usize;

/// Size type for user memory operations
pub type Size = usize;
