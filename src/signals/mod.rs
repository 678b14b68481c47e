/*!
 * Signals Module
 * Signal numbering and classification consumed by the wait subsystem
 */

pub mod types;

pub use types::{Signal, SignalError, SignalResult};
