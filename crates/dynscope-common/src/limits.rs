//! Centralized limits and thresholds.
//!
//! Scope chains, declaring-type chains and base-type chains are all walked
//! iteratively; these bounds stop a malformed catalog from looping forever.

// =============================================================================
// Operation Counts
// =============================================================================

/// Maximum number of blocks visited while walking a scope chain outward.
pub const MAX_SCOPE_WALK_ITERATIONS: u32 = 10_000;

/// Maximum depth of the declaring-type chain for nested types.
///
/// A cycle in `declaring_type` links (only possible in a hand-built catalog)
/// would otherwise make the type scope stack unbounded.
pub const MAX_TYPE_NESTING_DEPTH: u32 = 256;

/// Maximum number of base types visited during member lookup.
pub const MAX_BASE_CHAIN_DEPTH: u32 = 256;

/// Maximum depth of the namespace parent chain.
pub const MAX_NAMESPACE_DEPTH: u32 = 128;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Default shard count for the dynamic side table. Must be a power of two.
pub const DEFAULT_SIDE_TABLE_SHARDS: usize = 64;

/// Upper bound on the side table shard count accepted from configuration.
pub const MAX_SIDE_TABLE_SHARDS: usize = 1 << 16;

/// Default number of newly created per-object entries between sweeps of
/// entries whose object has been dropped.
pub const DEFAULT_SWEEP_INTERVAL: usize = 1_024;
