/*!
 * Process Lifecycle
 * State transitions driven by the exit/stop/continue machinery.
 * Every transition runs under the registry lock and notifies matching
 * waiters before the lock is released.
 */

use crate::core::types::{Pid, Tid};
use crate::process::table::ProcessTable;
use crate::process::types::{ExitStatus, ProcessError, ProcessResult, ThreadState};
use crate::signals::Signal;
use crate::wait::blocker::wake_matching;
use crate::wait::types::WaitEvent;
use log::info;

impl ProcessTable {
    /// Terminate a process: every thread goes Dead and the exit status is
    /// recorded, making the process harvestable. Exiting twice is an error.
    pub fn exit(&self, pid: Pid, status: ExitStatus) -> ProcessResult<()> {
        let mut inner = self.lock();
        let desc = inner
            .processes
            .get_mut(&pid)
            .ok_or(ProcessError::ProcessNotFound(pid))?;
        if desc.is_dead() {
            return Err(ProcessError::AlreadyDead(pid));
        }
        desc.exit_status = Some(status);
        for thread in &mut desc.threads {
            thread.state = ThreadState::Dead;
        }
        info!("process {} exited: {:?}", pid, status);
        wake_matching(&mut inner, pid, WaitEvent::Exited);
        Ok(())
    }

    /// Stop a process with a stop signal. Stopping an already-stopped
    /// process is a no-op and does not notify waiters again.
    pub fn stop(&self, pid: Pid, signal: Signal) -> ProcessResult<()> {
        if !signal.is_stop_signal() {
            return Err(ProcessError::NotAStopSignal(signal));
        }
        let mut inner = self.lock();
        let desc = inner
            .processes
            .get_mut(&pid)
            .ok_or(ProcessError::ProcessNotFound(pid))?;
        if desc.is_dead() {
            return Err(ProcessError::AlreadyDead(pid));
        }
        if desc.state() == ThreadState::Stopped {
            return Ok(());
        }
        for thread in &mut desc.threads {
            if thread.state.is_live_running_set() {
                thread.state = ThreadState::Stopped;
                thread.stop_signal = Some(signal);
            }
        }
        info!("process {} stopped by {}", pid, signal);
        wake_matching(&mut inner, pid, WaitEvent::Stopped);
        Ok(())
    }

    /// Resume a stopped process. Returns whether a Stopped -> Runnable
    /// transition actually happened; resuming a non-stopped process is a
    /// no-op. The continue event is edge-observed: only waiters registered
    /// at this moment see it.
    pub fn resume(&self, pid: Pid) -> ProcessResult<bool> {
        let mut inner = self.lock();
        let desc = inner
            .processes
            .get_mut(&pid)
            .ok_or(ProcessError::ProcessNotFound(pid))?;
        if desc.is_dead() {
            return Err(ProcessError::AlreadyDead(pid));
        }
        if desc.state() != ThreadState::Stopped {
            return Ok(false);
        }
        for thread in &mut desc.threads {
            if thread.state == ThreadState::Stopped {
                thread.state = ThreadState::Runnable;
            }
        }
        info!("process {} continued", pid);
        wake_matching(&mut inner, pid, WaitEvent::Continued);
        Ok(true)
    }

    /// Scheduler bookkeeping among the live non-stopped states. Stopped and
    /// Dead are rejected here; those transitions flow through stop/exit only.
    pub fn set_thread_state(&self, pid: Pid, tid: Tid, state: ThreadState) -> ProcessResult<()> {
        let mut inner = self.lock();
        let desc = inner
            .processes
            .get_mut(&pid)
            .ok_or(ProcessError::ProcessNotFound(pid))?;
        let thread = desc
            .threads
            .iter_mut()
            .find(|t| t.tid == tid)
            .ok_or(ProcessError::ThreadNotFound(tid))?;
        if !thread.state.is_live_running_set() || !state.is_live_running_set() {
            return Err(ProcessError::InvalidStateTransition {
                from: thread.state,
                to: state,
            });
        }
        thread.state = state;
        Ok(())
    }
}
