/*!
 * Syscall Types
 * Errno values and the packed waitid parameter block
 */

use crate::core::types::{Address, Pid};
use crate::wait::types::WaitError;
use log::error;
use serde::{Deserialize, Serialize};

/// Error numbers returned (negated) across the syscall boundary,
/// Linux-compatible values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Errno {
    /// Interrupted system call
    Intr = 4,
    /// No child processes
    Child = 10,
    /// Bad address
    Fault = 14,
    /// Invalid argument
    Inval = 22,
}

impl Errno {
    /// The negative return value user space sees
    pub const fn as_return(self) -> i32 {
        -(self as i32)
    }
}

impl From<&WaitError> for Errno {
    fn from(err: &WaitError) -> Self {
        match err {
            WaitError::InvalidArgument(_) => Errno::Inval,
            WaitError::NoSuchChild(_) | WaitError::NoChildren(_) => Errno::Child,
            WaitError::Interrupted => Errno::Intr,
            WaitError::BadAddress(_) => Errno::Fault,
            WaitError::InvariantViolation { .. } => {
                // State-machine corruption: loudly reported, conservatively
                // surfaced as EINVAL instead of undefined behavior
                error!("lifecycle invariant violation surfaced to caller: {}", err);
                Errno::Inval
            }
        }
    }
}

/// Wire size of the packed parameter block: idtype u32, id u32,
/// infop u64, options u32, little-endian
pub const WAITID_PARAMS_BYTES: usize = 20;

/// Decoded waitid parameter block, copied in from user memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitidParams {
    pub idtype: u32,
    pub id: Pid,
    pub infop: Address,
    pub options: u32,
}

impl WaitidParams {
    pub fn decode(bytes: &[u8; WAITID_PARAMS_BYTES]) -> Self {
        Self {
            idtype: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            id: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            infop: u64::from_le_bytes([
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ]) as Address,
            options: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
        }
    }

    pub fn encode(&self) -> [u8; WAITID_PARAMS_BYTES] {
        let mut bytes = [0u8; WAITID_PARAMS_BYTES];
        bytes[0..4].copy_from_slice(&self.idtype.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.id.to_le_bytes());
        bytes[8..16].copy_from_slice(&(self.infop as u64).to_le_bytes());
        bytes[16..20].copy_from_slice(&self.options.to_le_bytes());
        bytes
    }
}
