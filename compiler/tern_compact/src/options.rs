//! Pass configuration.

/// Knobs for one compaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactOptions {
    /// Run [`verify_packed`](crate::verify_packed) on every block after
    /// writing and fail the pass if it does not hold.
    pub verify: bool,
    /// Refuse to allocate blocks larger than this.
    pub max_block_bytes: usize,
}

impl Default for CompactOptions {
    /// Verification is on in debug builds; no size limit.
    fn default() -> Self {
        CompactOptions {
            verify: cfg!(debug_assertions),
            max_block_bytes: usize::MAX,
        }
    }
}

impl CompactOptions {
    /// Enables verification when set to anything but empty or `0`.
    pub const VERIFY_VAR: &'static str = "TERN_COMPACT_VERIFY";

    /// Byte limit for a single block.
    pub const MAX_BLOCK_VAR: &'static str = "TERN_COMPACT_MAX_BLOCK";

    /// Defaults overridden by `TERN_COMPACT_VERIFY` and
    /// `TERN_COMPACT_MAX_BLOCK`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the two
    /// variable names.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = CompactOptions::default();
        if let Some(value) = lookup(Self::VERIFY_VAR) {
            let value = value.trim();
            options.verify = !value.is_empty() && value != "0";
        }
        if let Some(value) = lookup(Self::MAX_BLOCK_VAR) {
            match value.trim().parse::<usize>() {
                Ok(limit) => options.max_block_bytes = limit,
                Err(_) => tracing::warn!(
                    value = %value,
                    "ignoring unparsable {}",
                    Self::MAX_BLOCK_VAR
                ),
            }
        }
        options
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn with_max_block_bytes(mut self, limit: usize) -> Self {
        self.max_block_bytes = limit;
        self
    }
}
