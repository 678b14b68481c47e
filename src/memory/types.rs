/*!
 * Memory Types
 * Protection flags and user-memory errors
 */

use crate::core::types::{Address, Pid, Size};
use bitflags::bitflags;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// User memory errors. Every variant maps to EFAULT at the syscall
/// boundary except the mapping-management ones, which only surface through
/// the region API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Address range {address:#x}+{len} not mapped in process {pid}")]
    Unmapped { pid: Pid, address: Address, len: Size },

    #[error("Protection violation at {address:#x} in process {pid}: need {needed:?}")]
    ProtectionViolation {
        pid: Pid,
        address: Address,
        needed: Protection,
    },

    #[error("Region at {address:#x} overlaps an existing mapping in process {pid}")]
    Overlap { pid: Pid, address: Address },

    #[error("Invalid range {address:#x}+{len}")]
    InvalidRange { address: Address, len: Size },

    #[error("Region limit exceeded for process {0}")]
    RegionLimitExceeded(Pid),
}

bitflags! {
    /// Access protection of a user memory region
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Protection: u32 {
        const READ = 0b001;
        const WRITE = 0b010;
        const EXEC = 0b100;
    }
}

impl Protection {
    pub fn readable(&self) -> bool {
        self.contains(Protection::READ)
    }

    pub fn writable(&self) -> bool {
        self.contains(Protection::WRITE)
    }
}
