/*!
 * User Memory Service
 * Byte-backed per-process address spaces with validation and copy
 * primitives. Locked independently of the process registry so a suspended
 * waiter cannot pin any mapping: other threads may unmap or reprotect a
 * region while a wait is blocked, which is exactly why callers must
 * re-validate after resuming.
 */

use crate::core::limits::{MAX_REGIONS_PER_PROCESS, MAX_USER_REGION_LEN};
use crate::core::types::{Address, Pid, Size};
use crate::memory::types::{MemoryError, MemoryResult, Protection};
use ahash::RandomState;
use dashmap::DashMap;
use log::debug;
use std::collections::BTreeMap;

struct Region {
    len: Size,
    prot: Protection,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct AddressSpace {
    // Keyed by region base address
    regions: BTreeMap<Address, Region>,
}

impl AddressSpace {
    /// Region fully containing [addr, addr+len), if any
    fn containing(&self, addr: Address, len: Size) -> Option<(Address, &Region)> {
        let (base, region) = self.regions.range(..=addr).next_back()?;
        let end = addr.checked_add(len)?;
        if *base + region.len >= end {
            Some((*base, region))
        } else {
            None
        }
    }

    fn containing_mut(&mut self, addr: Address, len: Size) -> Option<(Address, &mut Region)> {
        let (base, region) = self.regions.range_mut(..=addr).next_back()?;
        let end = addr.checked_add(len)?;
        if *base + region.len >= end {
            Some((*base, region))
        } else {
            None
        }
    }
}

/// Validate/copy service over untrusted user memory
pub struct UserMemory {
    spaces: DashMap<Pid, AddressSpace, RandomState>,
}

impl UserMemory {
    pub fn new() -> Self {
        Self {
            spaces: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Map a zero-filled region at `addr`
    pub fn map(&self, pid: Pid, addr: Address, len: Size, prot: Protection) -> MemoryResult<()> {
        if len == 0 || len > MAX_USER_REGION_LEN {
            return Err(MemoryError::InvalidRange { address: addr, len });
        }
        let end = addr
            .checked_add(len)
            .ok_or(MemoryError::InvalidRange { address: addr, len })?;
        let mut space = self.spaces.entry(pid).or_default();
        if space.regions.len() >= MAX_REGIONS_PER_PROCESS {
            return Err(MemoryError::RegionLimitExceeded(pid));
        }
        // The closest region starting below `end` is the only overlap candidate
        if let Some((base, region)) = space.regions.range(..end).next_back() {
            if base + region.len > addr {
                return Err(MemoryError::Overlap { pid, address: addr });
            }
        }
        space.regions.insert(
            addr,
            Region {
                len,
                prot,
                bytes: vec![0; len],
            },
        );
        debug!("mapped {:#x}+{} in process {} ({:?})", addr, len, pid, prot);
        Ok(())
    }

    /// Remove the region based at exactly `addr`
    pub fn unmap(&self, pid: Pid, addr: Address) -> MemoryResult<()> {
        let mut space = self
            .spaces
            .get_mut(&pid)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: 0 })?;
        space
            .regions
            .remove(&addr)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: 0 })?;
        debug!("unmapped {:#x} in process {}", addr, pid);
        Ok(())
    }

    /// Change the protection of the region based at exactly `addr`
    pub fn protect(&self, pid: Pid, addr: Address, prot: Protection) -> MemoryResult<()> {
        let mut space = self
            .spaces
            .get_mut(&pid)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: 0 })?;
        let region = space
            .regions
            .get_mut(&addr)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: 0 })?;
        region.prot = prot;
        debug!("reprotected {:#x} in process {} to {:?}", addr, pid, prot);
        Ok(())
    }

    /// Probe that [addr, addr+len) is mapped and readable
    pub fn validate_read(&self, pid: Pid, addr: Address, len: Size) -> MemoryResult<()> {
        self.validate(pid, addr, len, Protection::READ)
    }

    /// Probe that [addr, addr+len) is mapped and writable
    pub fn validate_write(&self, pid: Pid, addr: Address, len: Size) -> MemoryResult<()> {
        self.validate(pid, addr, len, Protection::WRITE)
    }

    fn validate(&self, pid: Pid, addr: Address, len: Size, needed: Protection) -> MemoryResult<()> {
        let space = self
            .spaces
            .get(&pid)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len })?;
        let (_, region) = space
            .containing(addr, len)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len })?;
        if !region.prot.contains(needed) {
            return Err(MemoryError::ProtectionViolation { pid, address: addr, needed });
        }
        Ok(())
    }

    /// Copy `len` bytes in from user memory, validating readability
    pub fn copy_in(&self, pid: Pid, addr: Address, len: Size) -> MemoryResult<Vec<u8>> {
        let space = self
            .spaces
            .get(&pid)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len })?;
        let (base, region) = space
            .containing(addr, len)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len })?;
        if !region.prot.readable() {
            return Err(MemoryError::ProtectionViolation {
                pid,
                address: addr,
                needed: Protection::READ,
            });
        }
        let offset = addr - base;
        Ok(region.bytes[offset..offset + len].to_vec())
    }

    /// Copy bytes out to user memory, validating writability
    pub fn copy_out(&self, pid: Pid, addr: Address, data: &[u8]) -> MemoryResult<()> {
        let mut space = self
            .spaces
            .get_mut(&pid)
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: data.len() })?;
        let (base, region) = space
            .containing_mut(addr, data.len())
            .ok_or(MemoryError::Unmapped { pid, address: addr, len: data.len() })?;
        if !region.prot.writable() {
            return Err(MemoryError::ProtectionViolation {
                pid,
                address: addr,
                needed: Protection::WRITE,
            });
        }
        let offset = addr - base;
        region.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Drop the whole address space of a terminated process
    pub fn release_process(&self, pid: Pid) {
        if self.spaces.remove(&pid).is_some() {
            debug!("released address space of process {}", pid);
        }
    }

    /// Number of regions mapped for `pid` (diagnostics)
    pub fn region_count(&self, pid: Pid) -> usize {
        self.spaces.get(&pid).map(|s| s.regions.len()).unwrap_or(0)
    }
}

impl Default for UserMemory {
    fn default() -> Self {
        Self::new()
    }
}
