//! Rolling keccak digest binding the appended leaf sequence.
//!
//! Always keccak-256, even when the tree hasher is something else: the
//! digest is a wire-format commitment shared with external optimistic
//! roll-up provers, not part of the tree hash.

use crate::hasher::keccak256;
use crate::tree::split_to_sub_trees;

/// Digests of both interpretations of one leaf batch.
///
/// Appending N individual leaves and appending the same leaves as depth-`d`
/// sub-trees produce different digests on purpose: the digest binds not
/// just the leaf values but the granularity they were committed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    /// Rolling digest over the individual leaves.
    pub merged: [u8; 32],
    /// Rolling digest over the padded sub-tree hashes.
    pub sub_tree_merged: [u8; 32],
}

/// Fold `leaves` into `base`: `digest = keccak256(digest || leaf)` per
/// leaf, 64 bytes in per iteration.
pub fn merge_leaves(base: [u8; 32], leaves: &[[u8; 32]]) -> [u8; 32] {
    let mut digest = base;
    let mut buf = [0u8; 64];
    for leaf in leaves {
        buf[..32].copy_from_slice(&digest);
        buf[32..].copy_from_slice(leaf);
        digest = keccak256(&buf);
    }
    digest
}

/// Hash one padded sub-tree as a flat byte run:
/// `keccak256(leaf[0] || leaf[1] || … || leaf[2^d - 1])`.
pub fn sub_tree_hash(sub_tree: &[[u8; 32]]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(sub_tree.len() * 32);
    for leaf in sub_tree {
        buf.extend_from_slice(leaf);
    }
    keccak256(&buf)
}

/// Fold the padded sub-tree hashes of `leaves` into `base`.
///
/// Splits `leaves` into zero-padded `2^d` groups, hashes each group flat,
/// then rolls the group hashes the same way [`merge_leaves`] rolls leaves.
pub fn merge_sub_trees(base: [u8; 32], leaves: &[[u8; 32]], sub_tree_depth: u8) -> [u8; 32] {
    let hashes: Vec<[u8; 32]> = split_to_sub_trees(leaves, sub_tree_depth)
        .iter()
        .map(|sub_tree| sub_tree_hash(sub_tree))
        .collect();
    merge_leaves(base, &hashes)
}

/// Both digests for one batch, from the same base.
pub fn merge_result(base: [u8; 32], leaves: &[[u8; 32]], sub_tree_depth: u8) -> MergeResult {
    MergeResult {
        merged: merge_leaves(base, leaves),
        sub_tree_merged: merge_sub_trees(base, leaves, sub_tree_depth),
    }
}
