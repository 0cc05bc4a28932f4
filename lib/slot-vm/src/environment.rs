//! Block and chain parameters visible to running code.

/// Block Timestamp - Epoch timestamp: 1st January 2025 `00::00::00`.
const BLOCK_TIMESTAMP: u64 = 1_735_689_600;
/// Arbitrum's CHAIN ID.
const CHAIN_ID: u64 = 42161;
/// Maximum nesting of call frames, same as the EVM.
const MAX_CALL_DEPTH: usize = 1024;

/// Execution environment of a [`crate::Vm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    block_timestamp: u64,
    chain_id: u64,
    max_call_depth: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            block_timestamp: BLOCK_TIMESTAMP,
            chain_id: CHAIN_ID,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

impl Environment {
    /// Sets the block timestamp reported to running code.
    #[must_use]
    pub fn with_block_timestamp(mut self, block_timestamp: u64) -> Self {
        self.block_timestamp = block_timestamp;
        self
    }

    /// Sets the chain id reported to running code.
    #[must_use]
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the deepest frame allowed before calls start failing.
    #[must_use]
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Gets the block timestamp.
    #[must_use]
    pub fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }

    /// Gets the chain id.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Gets the maximum call depth.
    #[must_use]
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}
