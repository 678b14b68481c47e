/*!
 * Process Types
 * Descriptors, lifecycle states, and process errors
 */

use crate::core::types::{Pid, Tid, Uid};
use crate::signals::Signal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Process not found: {0}")]
    ProcessNotFound(Pid),

    #[error("Thread not found: {0}")]
    ThreadNotFound(Tid),

    #[error("Process already dead: {0}")]
    AlreadyDead(Pid),

    #[error("Not a stop signal: {0}")]
    NotAStopSignal(Signal),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: ThreadState, to: ThreadState },

    #[error("Process limit exceeded: current {current}, limit {limit}")]
    ProcessLimitExceeded { current: usize, limit: usize },
}

/// Thread lifecycle state
///
/// Mutated exclusively by the lifecycle operations on [`super::ProcessTable`];
/// the wait subsystem only reads it under the registry lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadState {
    /// Currently executing on a CPU
    Running,
    /// Ready to run, waiting for a CPU
    Runnable,
    /// Waiting on I/O or an event
    Blocked,
    /// Suspended by a stop signal
    Stopped,
    /// Exiting, not yet harvestable
    Dying,
    /// Terminated; the owning process is harvestable once all threads are Dead
    Dead,
    /// Parked on a scheduler queue
    Queued,
}

impl ThreadState {
    /// States a live, non-stopped thread can be in. Transitioning out of
    /// Stopped into any of these is the "continued" event.
    pub fn is_live_running_set(&self) -> bool {
        matches!(
            self,
            ThreadState::Running
                | ThreadState::Runnable
                | ThreadState::Blocked
                | ThreadState::Dying
                | ThreadState::Queued
        )
    }
}

/// How a process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// Voluntary exit with a code
    Exited(i32),
    /// Terminated by a signal
    Killed(Signal),
}

/// Per-thread record inside a process descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThreadDescriptor {
    pub tid: Tid,
    pub state: ThreadState,
    /// Last signal that stopped this thread. Kept across resume so a
    /// continued report can still carry it.
    pub stop_signal: Option<Signal>,
}

impl ThreadDescriptor {
    pub fn new(tid: Tid) -> Self {
        Self {
            tid,
            state: ThreadState::Runnable,
            stop_signal: None,
        }
    }
}

/// Process descriptor, owned by the process table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub name: String,
    pub parent: Option<Pid>,
    pub uid: Uid,
    pub threads: Vec<ThreadDescriptor>,
    pub exit_status: Option<ExitStatus>,
}

impl ProcessDescriptor {
    pub fn new(pid: Pid, name: String, parent: Option<Pid>, uid: Uid) -> Self {
        Self {
            pid,
            name,
            parent,
            uid,
            // Main thread shares the process id
            threads: vec![ThreadDescriptor::new(pid)],
            exit_status: None,
        }
    }

    /// A process is harvestable iff every thread is Dead and an exit
    /// status was recorded.
    pub fn is_dead(&self) -> bool {
        self.exit_status.is_some() && self.threads.iter().all(|t| t.state == ThreadState::Dead)
    }

    /// The representative thread for status reporting
    pub fn main_thread(&self) -> Option<&ThreadDescriptor> {
        self.threads.iter().find(|t| t.tid == self.pid)
    }

    /// Representative lifecycle state (the main thread's)
    pub fn state(&self) -> ThreadState {
        self.main_thread()
            .map(|t| t.state)
            .unwrap_or(ThreadState::Dead)
    }
}

/// Clonable view of a descriptor, handed out by lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessSnapshot {
    pub pid: Pid,
    pub name: String,
    pub parent: Option<Pid>,
    pub uid: Uid,
    pub state: ThreadState,
    pub exit_status: Option<ExitStatus>,
}

impl From<&ProcessDescriptor> for ProcessSnapshot {
    fn from(desc: &ProcessDescriptor) -> Self {
        Self {
            pid: desc.pid,
            name: desc.name.clone(),
            parent: desc.parent,
            uid: desc.uid,
            state: desc.state(),
            exit_status: desc.exit_status,
        }
    }
}
