/*!
 * Core Module
 * Shared primitive types and system-wide limits
 */

pub mod limits;
pub mod types;

pub use types::{Address, Pid, Size, Tid, Uid};
