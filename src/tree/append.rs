//! Single-leaf append and batch roll-up.

use crate::{Hasher, Result, RollUpError};

use super::{starting_leaf_proof, Tree};

/// Outcome of a roll-up batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollUpOutcome {
    /// Root after the batch.
    pub root: [u8; 32],
    /// Next insertion index after the batch.
    pub index: u64,
    /// Number of `parent_of` calls performed.
    pub hash_count: u32,
}

/// Append one leaf at `index`, updating the frontier in place.
///
/// `siblings` must be the frontier accepted by `starting_leaf_proof` for
/// `index`; on return it is the frontier for `index + 1`. Returns the new
/// root.
///
/// Walking up from the leaf: a clear path bit means the current node is
/// the new frontier entry at that level and its right sibling is empty; a
/// set bit means the stored frontier entry is the left sibling and stays.
/// Only levels under the trailing run of set bits of `index` change, which
/// is exactly what the in-place write produces.
pub(crate) fn append_leaf<H: Hasher>(
    hasher: &H,
    index: u64,
    leaf: [u8; 32],
    siblings: &mut [[u8; 32]],
) -> [u8; 32] {
    let zeroes = hasher.pre_hashed_zero();
    let mut node = leaf;
    let mut path = index;
    for level in 0..siblings.len() {
        if path & 1 == 0 {
            siblings[level] = node;
            node = hasher.parent_of(&node, &zeroes[level]);
        } else {
            node = hasher.parent_of(&siblings[level], &node);
        }
        path >>= 1;
    }
    node
}

/// Append a batch of leaves to the tree described by `(prev_root, index)`.
///
/// Verifies the starting-leaf proof for `initial_siblings`, then folds
/// single-leaf appends over `leaves`, threading the frontier. Fails
/// without hashing anything if the proof is rejected or the batch would
/// exceed the tree capacity.
pub fn roll_up<H: Hasher>(
    hasher: &H,
    prev_root: [u8; 32],
    index: u64,
    leaves: &[[u8; 32]],
    initial_siblings: &[[u8; 32]],
) -> Result<RollUpOutcome> {
    let depth = hasher.depth();
    let capacity = Tree::capacity(depth);
    let end = index
        .checked_add(leaves.len() as u64)
        .filter(|end| *end <= capacity)
        .ok_or(RollUpError::TreeFull { capacity, index })?;

    if !starting_leaf_proof(hasher, prev_root, index, initial_siblings) {
        return Err(RollUpError::InvalidStartingProof { index });
    }

    let mut siblings = initial_siblings.to_vec();
    let mut root = prev_root;
    for (i, leaf) in leaves.iter().enumerate() {
        root = append_leaf(hasher, index + i as u64, *leaf, &mut siblings);
    }

    Ok(RollUpOutcome {
        root,
        index: end,
        hash_count: depth as u32 * leaves.len() as u32,
    })
}
