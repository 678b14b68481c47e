/*!
 * Process Table
 * The global lock-guarded registry: pid -> descriptor, plus the
 * wait-interest registrations that must be serialized with it
 */

use crate::core::limits::MAX_PROCESSES;
use crate::core::types::{Pid, Uid};
use crate::process::types::{ProcessDescriptor, ProcessError, ProcessResult, ProcessSnapshot};
use crate::wait::blocker::WaitRegistration;
use log::info;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Everything the registry lock guards.
///
/// Wait-interest registrations live behind the same lock as the descriptors
/// they watch, so "check current state" and "register interest" compose into
/// one critical section and a concurrent transition can never slip between
/// them.
pub(crate) struct TableInner {
    pub(crate) processes: HashMap<Pid, ProcessDescriptor>,
    pub(crate) waiters: Vec<Arc<WaitRegistration>>,
}

impl TableInner {
    pub(crate) fn children_of(&self, parent: Pid) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self
            .processes
            .values()
            .filter(|d| d.parent == Some(parent))
            .map(|d| d.pid)
            .collect();
        pids.sort_unstable();
        pids
    }
}

/// Lock-guarded global process registry.
///
/// Single source of truth for process existence and state in this
/// subsystem. Insertion happens at spawn, removal only inside the reap
/// critical section.
pub struct ProcessTable {
    inner: Mutex<TableInner>,
    next_pid: AtomicU32,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                processes: HashMap::new(),
                waiters: Vec::new(),
            }),
            next_pid: AtomicU32::new(1),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock()
    }

    /// Insert-at-create transactional operation. The new process starts
    /// with a single runnable main thread (tid == pid).
    pub fn spawn(&self, name: &str, parent: Option<Pid>, uid: Uid) -> ProcessResult<Pid> {
        let mut inner = self.lock();
        if inner.processes.len() >= MAX_PROCESSES {
            return Err(ProcessError::ProcessLimitExceeded {
                current: inner.processes.len(),
                limit: MAX_PROCESSES,
            });
        }
        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        inner
            .processes
            .insert(pid, ProcessDescriptor::new(pid, name.to_string(), parent, uid));
        info!("spawned process {} ({:?}) parent={:?} uid={}", pid, name, parent, uid);
        Ok(pid)
    }

    pub fn exists(&self, pid: Pid) -> bool {
        self.lock().processes.contains_key(&pid)
    }

    pub fn lookup(&self, pid: Pid) -> Option<ProcessSnapshot> {
        self.lock().processes.get(&pid).map(ProcessSnapshot::from)
    }

    /// Pids of all live children of `parent`, sorted for determinism
    pub fn children_of(&self, parent: Pid) -> Vec<Pid> {
        self.lock().children_of(parent)
    }

    pub fn process_count(&self) -> usize {
        self.lock().processes.len()
    }

    /// Number of currently registered waiters (diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
