/// Desired gap between consecutive blocks, in milliseconds.
pub const TARGET_BLOCK_INTERVAL_MS: u64 = 60_000;
pub const MIN_DIFFICULTY: u32 = 1;
pub const GENESIS_DIFFICULTY: u32 = 1;
/// 2024-01-01T00:00:00Z
pub const GENESIS_TIMESTAMP_MS: u64 = 1_704_067_200_000;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_MINER: &str = "genesis";
/// Nonces tried between two looks at the superseded flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;
