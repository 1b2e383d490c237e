//! Error types for roll-up operations.

use thiserror::Error;

/// Alias for `core::result::Result<T, RollUpError>`.
pub type Result<T> = core::result::Result<T, RollUpError>;

/// Errors from roll-up engine operations.
///
/// Covers rejected proofs, violated preconditions, capacity overflow, and
/// failures propagated from the host storage layer. None of these are
/// retried internally; the accumulator state is never advanced on error.
#[derive(Debug, Error)]
pub enum RollUpError {
    /// The starting-leaf (or empty-sub-tree) proof does not show `index` as
    /// the first empty slot under the given root.
    #[error("invalid starting-leaf proof at index {index}")]
    InvalidStartingProof {
        /// Insertion index the rejected proof was given for.
        index: u64,
    },
    /// A sub-tree insertion index is not aligned to the sub-tree size.
    #[error("index {index} is not a multiple of the sub-tree size {sub_tree_size}")]
    UnalignedIndex {
        /// Offending insertion index.
        index: u64,
        /// Sub-tree size (`2^d`) the index must be a multiple of.
        sub_tree_size: u64,
    },
    /// The append would exceed the fixed capacity of the tree.
    #[error("tree is full (capacity {capacity}, next index {index})")]
    TreeFull {
        /// Maximum number of leaves (`2^depth`).
        capacity: u64,
        /// Index the rejected append started from.
        index: u64,
    },
    /// A sibling-cached update was requested before `init_with_siblings`.
    #[error("on-chain siblings are not initialized")]
    SiblingsNotInitialized,
    /// A hard pre-check of `SplitRollUp::verify` failed.
    #[error("split roll-up does not match the claim: {0} differs")]
    VerifyMismatch(&'static str),
    /// Invalid input parameters (depth out of range, wrong sibling count,
    /// oversized sub-tree leaf slice).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Persisted data is invalid or corrupt.
    #[error("corrupted data: {0}")]
    InvalidData(String),
    /// An error propagated from the host storage layer.
    #[error("storage error: {0}")]
    StorageError(String),
}
