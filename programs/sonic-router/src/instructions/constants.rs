//! Shared constants for instruction handlers

/// Divisor for basis points calculations (100% = 10000 bps)
pub const BASIS_POINTS_DIVISOR: u16 = 10000;

// ============================================================================
// Message Limits
// ============================================================================

/// Maximum accounts an invoke message may reference
pub const MAX_INVOKE_ACCOUNTS: usize = 32;

/// Maximum invoke instruction data in bytes
pub const MAX_INVOKE_DATA_LEN: usize = 1024;
