/*!
 * Reaper
 * The exactly-once harvest: extracting a dead process's exit status and
 * removing it from the registry in a single critical section
 */

use crate::core::types::Pid;
use crate::memory::UserMemory;
use crate::process::table::TableInner;
use crate::wait::status::StatusRecord;
use crate::wait::types::{WaitError, WaitResult};
use log::{error, info};

/// Harvest a dead process.
///
/// Takes the locked registry state so status extraction and removal cannot
/// be separated by a concurrent reap: whoever removes the descriptor wins,
/// every later attempt sees NoSuchChild. Callers must have observed the
/// process dead under this same lock acquisition.
pub(crate) fn reap(
    inner: &mut TableInner,
    pid: Pid,
    memory: &UserMemory,
) -> WaitResult<StatusRecord> {
    let Some(desc) = inner.processes.remove(&pid) else {
        return Err(WaitError::NoSuchChild(pid));
    };
    if !desc.is_dead() {
        // Not harvestable after all; put it back untouched
        let state = desc.state();
        inner.processes.insert(pid, desc);
        error!("reap of live process {} in state {:?}", pid, state);
        return Err(WaitError::InvariantViolation { pid, state });
    }
    let Some(status) = desc.exit_status else {
        // is_dead() implies a recorded status; reaching here is corruption
        inner.processes.insert(pid, desc);
        error!("dead process {} has no exit status", pid);
        return Err(WaitError::InvariantViolation {
            pid,
            state: crate::process::types::ThreadState::Dead,
        });
    };

    memory.release_process(pid);
    info!("reaped process {} ({:?}): {:?}", pid, desc.name, status);
    Ok(StatusRecord::from_exit_status(pid, desc.uid, status))
}
