//! Append-only Merkle tree roll-up engine with pluggable two-to-one
//! hashing.
//!
//! Lets a verifier update the root of a large, mostly-empty, fixed-depth
//! Merkle tree by appending leaves, given only the current root, the next
//! insertion index, and the sibling path down to the first empty leaf.
//! The tree is strictly append-only: a leaf, once written, never changes.
//!
//! # Core types
//!
//! - [`Hasher`] — the hash capability: `parent_of` plus the pre-hashed
//!   zero table. [`KeccakHasher`] and [`Blake3Hasher`] are provided.
//! - [`Tree`] — a `(root, index)` state snapshot.
//! - [`SplitRollUp`] / [`Opru`] — the persistent accumulator for roll-ups
//!   spanning multiple calls, and the off-chain claim it is verified
//!   against.
//!
//! # Operations
//!
//! - [`roll_up`] — batched single-leaf appends, gated by the
//!   starting-leaf proof.
//! - [`roll_up_sub_trees`] / [`sub_tree_root`] / [`split_to_sub_trees`] —
//!   bulk insertion at `2^d` granularity, hashing one `D - d` deep path
//!   per group.
//! - [`merkle_root`] / [`merkle_proof`] / [`starting_leaf_proof`] — the
//!   underlying proof primitives.
//! - [`merge_leaves`] / [`merge_sub_trees`] / [`merge_result`] — the
//!   keccak rolling digest binding the appended leaf sequence.
//!
//! # Store traits
//!
//! - [`RollUpStore`] — minimal KV boundary a host provides to persist a
//!   [`SplitRollUp`].

#![warn(missing_docs)]

mod error;
mod hasher;
mod split;
mod store;
mod tree;

pub use error::{Result, RollUpError};
pub use hasher::{keccak256, Blake3Hasher, Hasher, KeccakHasher};
pub use split::{
    merge_leaves, merge_result, merge_sub_trees, sub_tree_hash, MergeResult, Opru, SplitRollUp,
};
#[cfg(any(test, feature = "mem_store"))]
pub use store::MemRollUpStore;
pub use store::{split_roll_up_key, RollUpStore};
pub use tree::{
    merkle_proof, merkle_root, roll_up, roll_up_sub_trees, split_to_sub_trees,
    starting_leaf_proof, sub_tree_root, RollUpOutcome, Tree,
};
