/*!
 * Waitid Syscall
 * Top-level orchestration of a wait call plus the ABI shim that brackets
 * the suspension point with independent user-pointer validations
 */

use crate::core::types::{Address, Pid};
use crate::memory::UserMemory;
use crate::process::table::ProcessTable;
use crate::process::types::ThreadState;
use crate::syscalls::types::{Errno, WaitidParams, WAITID_PARAMS_BYTES};
use crate::wait::blocker::WaitBlocker;
use crate::wait::reaper;
use crate::wait::status::{StatusRecord, STATUS_RECORD_BYTES};
use crate::wait::types::{
    ChildSelector, WaitError, WaitOptions, WaitOutcome, WaitResult, WaitSpecification, WaitTarget,
};
use log::{debug, warn};
use std::sync::Arc;

/// Executes wait syscalls against the process table and user memory
pub struct SyscallExecutor {
    table: Arc<ProcessTable>,
    memory: Arc<UserMemory>,
    blocker: WaitBlocker,
}

impl SyscallExecutor {
    pub fn new(table: Arc<ProcessTable>, memory: Arc<UserMemory>) -> Self {
        let blocker = WaitBlocker::new(Arc::clone(&table));
        Self {
            table,
            memory,
            blocker,
        }
    }

    /// Signal-delivery hook: abort any wait `pid` is currently blocked in
    pub fn interrupt(&self, pid: Pid) {
        self.blocker.interrupt(pid);
    }

    /// The wait operation proper. `Ok(None)` is the non-blocking
    /// nothing-ready outcome.
    pub fn do_waitid(
        &self,
        caller: Pid,
        selector: ChildSelector,
        options: WaitOptions,
    ) -> WaitResult<Option<StatusRecord>> {
        let spec = WaitSpecification::resolve(selector, options)?;

        // Advisory pre-checks under the registry lock. An exact pid may
        // still vanish before the blocker runs; that case reproduces the
        // same error after wake.
        match spec.target {
            WaitTarget::Process(pid) => {
                if !self.table.exists(pid) {
                    return Err(WaitError::NoSuchChild(pid));
                }
            }
            WaitTarget::AnyChild => {
                if self.table.children_of(caller).is_empty() {
                    return Err(WaitError::NoChildren(caller));
                }
            }
        }

        let satisfied_by = match self.blocker.block(caller, &spec) {
            WaitOutcome::WouldBlock => return Ok(None),
            WaitOutcome::Interrupted => return Err(WaitError::Interrupted),
            WaitOutcome::Satisfied(pid) => pid,
        };

        // Re-acquire the registry lock and re-resolve: the satisfying pid
        // may have been reaped by a concurrent waiter in the meantime.
        let mut inner = self.table.lock();
        let (is_dead, state, stop_signal, uid) = {
            let Some(desc) = inner.processes.get(&satisfied_by) else {
                return Err(WaitError::NoSuchChild(satisfied_by));
            };
            (
                desc.is_dead(),
                desc.state(),
                desc.main_thread().and_then(|t| t.stop_signal),
                desc.uid,
            )
        };

        if is_dead {
            return reaper::reap(&mut inner, satisfied_by, &self.memory).map(Some);
        }

        if !options.non_blocking() && state != ThreadState::Stopped && !options.report_continued()
        {
            // Satisfied by a stop, but the child raced back to running
            // before we re-acquired the lock
            warn!(
                "blocking wait by {} observed {} in state {:?} after wake",
                caller, satisfied_by, state
            );
        }
        StatusRecord::from_live_state(satisfied_by, uid, state, stop_signal).map(Some)
    }

    /// ABI entry point. Returns 0 with the status record written to the
    /// destination, or a negative errno with the destination untouched
    /// (beyond the initial writability probe).
    pub fn sys_waitid(&self, caller: Pid, params_addr: Address) -> i32 {
        let raw = match self.memory.copy_in(caller, params_addr, WAITID_PARAMS_BYTES) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("waitid params copy-in failed for {}: {}", caller, err);
                return Errno::Fault.as_return();
            }
        };
        let Ok(bytes) = <[u8; WAITID_PARAMS_BYTES]>::try_from(raw.as_slice()) else {
            return Errno::Fault.as_return();
        };
        let params = WaitidParams::decode(&bytes);
        debug!(
            "waitid(caller={}, idtype={}, id={}, infop={:#x}, options={:#x})",
            caller, params.idtype, params.id, params.infop, params.options
        );

        // Probe the destination before any chance of blocking
        if self
            .memory
            .validate_write(caller, params.infop, STATUS_RECORD_BYTES)
            .is_err()
        {
            return Errno::Fault.as_return();
        }

        let selector = match ChildSelector::from_raw(params.idtype, params.id) {
            Ok(selector) => selector,
            Err(err) => return Errno::from(&err).as_return(),
        };
        let options = WaitOptions::from_raw(params.options);

        let record = match self.do_waitid(caller, selector, options) {
            Ok(Some(record)) => record,
            Ok(None) => StatusRecord::zeroed(),
            Err(err) => return Errno::from(&err).as_return(),
        };

        // The registry lock was dropped while blocked, so another thread
        // may have unmapped or reprotected the destination. Validation
        // performed before blocking proves nothing now; probe again.
        if self
            .memory
            .validate_write(caller, params.infop, STATUS_RECORD_BYTES)
            .is_err()
        {
            return Errno::Fault.as_return();
        }
        if self
            .memory
            .copy_out(caller, params.infop, &record.encode())
            .is_err()
        {
            return Errno::Fault.as_return();
        }
        0
    }
}
