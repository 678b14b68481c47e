/*!
 * System Limits
 *
 * Centralized location for system-wide limits and thresholds.
 * All values include rationale comments explaining WHY they exist.
 */

/// Maximum live processes in the table (4096)
/// Bounds registry memory and keeps full-table scans cheap
pub const MAX_PROCESSES: usize = 4096;

/// Maximum length of a single user memory region (64MB)
/// [SECURITY] Prevents a single mapping from exhausting host memory,
/// since regions are byte-backed
pub const MAX_USER_REGION_LEN: usize = 64 * 1024 * 1024;

/// Maximum regions per address space (1024)
/// Keeps containment lookups and overlap checks bounded
pub const MAX_REGIONS_PER_PROCESS: usize = 1024;
