/*!
 * Wait Types
 * Selectors, options, outcomes, and wait errors
 */

use crate::core::types::Pid;
use crate::memory::types::MemoryError;
use crate::process::types::ThreadState;
use bitflags::bitflags;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wait operation result
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait errors. All are terminal for a single wait invocation; nothing is
/// retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Invalid wait selector: {0}")]
    InvalidArgument(&'static str),

    #[error("No such waitable child: {0}")]
    NoSuchChild(Pid),

    #[error("Process {0} has no waitable children")]
    NoChildren(Pid),

    #[error("Wait interrupted by signal")]
    Interrupted,

    #[error("Bad user address: {0}")]
    BadAddress(#[from] MemoryError),

    #[error("Lifecycle invariant violated: process {pid} observed live in state {state:?}")]
    InvariantViolation { pid: Pid, state: ThreadState },
}

/// Raw selector kind as supplied by the caller, before resolution.
/// Group/session waits are an explicit variant so they fail closed instead
/// of falling through to "any child".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSelector {
    /// Any child of the caller (P_ALL)
    All,
    /// Exactly this process (P_PID)
    Pid(Pid),
    /// Process group (P_PGID) - parsed but unsupported
    Group(Pid),
}

/// Linux-compatible idtype constants
pub const P_ALL: u32 = 0;
pub const P_PID: u32 = 1;
pub const P_PGID: u32 = 2;

impl ChildSelector {
    /// Decode the syscall idtype/id pair
    pub fn from_raw(idtype: u32, id: Pid) -> WaitResult<Self> {
        match idtype {
            P_ALL => Ok(ChildSelector::All),
            P_PID => Ok(ChildSelector::Pid(id)),
            P_PGID => Ok(ChildSelector::Group(id)),
            _ => Err(WaitError::InvalidArgument("unknown idtype")),
        }
    }
}

/// Resolved wait target. "Any child" only becomes a concrete pid after the
/// blocker reports which process satisfied the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitTarget {
    AnyChild,
    Process(Pid),
}

bitflags! {
    /// Options bitmask, Linux waitid values
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WaitOptions: u32 {
        /// Return immediately instead of blocking
        const NOHANG = 0x1;
        /// Report stopped children (always honored)
        const STOPPED = 0x2;
        /// Report exited children (always honored)
        const EXITED = 0x4;
        /// Report children continued out of a stop
        const CONTINUED = 0x8;
    }
}

impl WaitOptions {
    /// Decode the raw bitmask, tolerating (but logging) unknown bits
    pub fn from_raw(bits: u32) -> Self {
        let options = WaitOptions::from_bits_truncate(bits);
        if options.bits() != bits {
            warn!("ignoring unknown wait option bits {:#x}", bits & !WaitOptions::all().bits());
        }
        options
    }

    pub fn non_blocking(&self) -> bool {
        self.contains(WaitOptions::NOHANG)
    }

    pub fn report_continued(&self) -> bool {
        self.contains(WaitOptions::CONTINUED)
    }
}

/// A qualifying lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEvent {
    Exited,
    Stopped,
    Continued,
}

/// Which children qualify and how the call blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpecification {
    pub target: WaitTarget,
    pub options: WaitOptions,
}

impl WaitSpecification {
    /// Resolve a raw selector. Unsupported selector kinds fail fast here,
    /// before any blocker is registered. The existence of an exact-pid
    /// target is checked separately (it needs the registry lock and is
    /// advisory anyway).
    pub fn resolve(selector: ChildSelector, options: WaitOptions) -> WaitResult<Self> {
        let target = match selector {
            ChildSelector::All => WaitTarget::AnyChild,
            ChildSelector::Pid(pid) => WaitTarget::Process(pid),
            ChildSelector::Group(_) => {
                return Err(WaitError::InvalidArgument("process-group wait not implemented"))
            }
        };
        Ok(WaitSpecification { target, options })
    }
}

/// What the blocker reports back to the orchestration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A qualifying transition happened on this concrete pid
    Satisfied(Pid),
    /// Woken by an external signal, not a qualifying transition
    Interrupted,
    /// Non-blocking call and nothing was ready
    WouldBlock,
}
