/*!
 * Status Records
 * Pure mapping from lifecycle state to the externally visible status
 * record, plus its fixed wire encoding
 */

use crate::core::types::{Pid, Uid};
use crate::process::types::{ExitStatus, ThreadState};
use crate::signals::Signal;
use crate::wait::types::{WaitError, WaitResult};
use serde::{Deserialize, Serialize};

/// Classification of the observed transition, Linux CLD_* values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum StatusCode {
    Exited = 1,
    Killed = 2,
    Stopped = 5,
    Continued = 6,
}

/// The output payload of a successful wait. Field layout mirrors siginfo:
/// the delivering signal is always SIGCHLD, except in the zeroed
/// nothing-ready record where every field is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusRecord {
    /// Signal number announcing the event (SIGCHLD, or 0 when zeroed)
    pub signal: u32,
    /// Originating process
    pub pid: Pid,
    /// Owner of the originating process
    pub uid: Uid,
    /// Transition classification (CLD_* value, 0 when zeroed)
    pub code: u32,
    /// Exit code or signal number, depending on `code`
    pub value: i32,
}

/// Wire size of an encoded record: five 32-bit little-endian fields
pub const STATUS_RECORD_BYTES: usize = 20;

impl StatusRecord {
    fn new(pid: Pid, uid: Uid, code: StatusCode, value: i32) -> Self {
        Self {
            signal: Signal::SIGCHLD.number(),
            pid,
            uid,
            code: code as u32,
            value,
        }
    }

    /// Build from a live (not dead) thread state, for stop/continue
    /// reporting.
    ///
    /// Observing Dead here is state-machine corruption: the caller must
    /// route dead processes through the reaper instead.
    pub fn from_live_state(
        pid: Pid,
        uid: Uid,
        state: ThreadState,
        stop_signal: Option<Signal>,
    ) -> WaitResult<Self> {
        let value = stop_signal.map(|s| s.number() as i32).unwrap_or(0);
        match state {
            ThreadState::Stopped => Ok(Self::new(pid, uid, StatusCode::Stopped, value)),
            s if s.is_live_running_set() => Ok(Self::new(pid, uid, StatusCode::Continued, value)),
            _ => Err(WaitError::InvariantViolation { pid, state }),
        }
    }

    /// Build from a recorded exit status, the reap path
    pub fn from_exit_status(pid: Pid, uid: Uid, status: ExitStatus) -> Self {
        match status {
            ExitStatus::Exited(code) => Self::new(pid, uid, StatusCode::Exited, code),
            ExitStatus::Killed(signal) => {
                Self::new(pid, uid, StatusCode::Killed, signal.number() as i32)
            }
        }
    }

    /// The nothing-ready record a non-blocking wait delivers: all zeroes,
    /// per the POSIX WNOHANG convention
    pub fn zeroed() -> Self {
        Self {
            signal: 0,
            pid: 0,
            uid: 0,
            code: 0,
            value: 0,
        }
    }

    /// Fixed little-endian wire encoding
    pub fn encode(&self) -> [u8; STATUS_RECORD_BYTES] {
        let mut bytes = [0u8; STATUS_RECORD_BYTES];
        bytes[0..4].copy_from_slice(&self.signal.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.pid.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.uid.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.code.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.value.to_le_bytes());
        bytes
    }
}
