//! Append-only fixed-depth Merkle tree: state snapshot, proof primitives,
//! and the starting-leaf proof that gates every append.
//!
//! The tree itself is never materialized. A `(root, index)` snapshot plus
//! the sibling path down to the first empty leaf (the *frontier*) is all
//! the engine needs to verify and perform appends.

mod append;
mod sub_tree;


pub(crate) use append::append_leaf;
pub use append::{roll_up, RollUpOutcome};
pub(crate) use sub_tree::{append_sub_tree_root, sub_tree_root_with_count};
pub use sub_tree::{roll_up_sub_trees, split_to_sub_trees, sub_tree_root};

use crate::{Hasher, Result, RollUpError};

/// State snapshot of an append-only tree.
///
/// `index` counts leaves already written; the next append occupies slot
/// `index`. For any snapshot produced by the engine there is exactly one
/// frontier accepted by [`starting_leaf_proof`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    /// Current Merkle root.
    pub root: [u8; 32],
    /// Next insertion index, `0 ..= 2^depth`.
    pub index: u64,
}

impl Tree {
    /// A fresh, fully-empty tree under the given hasher.
    ///
    /// The root is the last entry of the hasher's pre-hashed zero table.
    pub fn new<H: Hasher>(hasher: &H) -> Self {
        let zeroes = hasher.pre_hashed_zero();
        Tree {
            root: zeroes[zeroes.len() - 1],
            index: 0,
        }
    }

    /// Maximum number of leaves a tree of `depth` can hold.
    pub fn capacity(depth: u8) -> u64 {
        1u64 << depth
    }

    /// Serialize to 40 bytes: `root(32) + index(8 BE)`.
    pub fn serialize(&self) -> [u8; 40] {
        let mut buf = [0u8; 40];
        buf[0..32].copy_from_slice(&self.root);
        buf[32..40].copy_from_slice(&self.index.to_be_bytes());
        buf
    }

    /// Deserialize from the 40-byte layout produced by [`Tree::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 40 {
            return Err(RollUpError::InvalidData(format!(
                "tree snapshot expected 40 bytes, got {}",
                bytes.len()
            )));
        }
        let mut root = [0u8; 32];
        root.copy_from_slice(&bytes[0..32]);
        let index = u64::from_be_bytes(
            bytes[32..40]
                .try_into()
                .map_err(|_| RollUpError::InvalidData("bad index bytes".into()))?,
        );
        Ok(Tree { root, index })
    }
}

/// Fold `leaf` at `index` up to a root, consuming one sibling per level.
///
/// At each level the low bit of the remaining path decides whether the
/// sibling sits to the right (bit 0) or the left (bit 1). The caller
/// supplies as many siblings as the logical depth being verified.
pub fn merkle_root<H: Hasher>(
    hasher: &H,
    leaf: [u8; 32],
    index: u64,
    siblings: &[[u8; 32]],
) -> [u8; 32] {
    let mut node = leaf;
    let mut path = index;
    for sibling in siblings {
        if path & 1 == 0 {
            node = hasher.parent_of(&node, sibling);
        } else {
            node = hasher.parent_of(sibling, &node);
        }
        path >>= 1;
    }
    node
}

/// True iff `leaf` at `index` hashes up to `root` through `siblings`.
pub fn merkle_proof<H: Hasher>(
    hasher: &H,
    root: [u8; 32],
    leaf: [u8; 32],
    index: u64,
    siblings: &[[u8; 32]],
) -> bool {
    merkle_root(hasher, leaf, index, siblings) == root
}

/// Prove that `index` is the first empty leaf slot under `root`.
///
/// Two conditions must hold, and together they pin the frontier uniquely:
///
/// 1. Bit pattern: at level `i`, bit `i` of `index` is 0 iff the sibling
///    is an (empty) pre-hashed zero. A clear bit means the sibling sits
///    to the right of a left-filled tree and must be empty; a set bit
///    means the sibling is an already-populated frontier node and must
///    not be.
/// 2. Binding: treating slot `index` as the zero leaf, the siblings hash
///    up to `root`.
///
/// Sibling vectors of the wrong length fail the proof.
pub fn starting_leaf_proof<H: Hasher>(
    hasher: &H,
    root: [u8; 32],
    index: u64,
    siblings: &[[u8; 32]],
) -> bool {
    starting_node_proof(hasher, root, 0, index, siblings)
}

/// Frontier check shared by leaf appends (`offset = 0`) and sub-tree
/// splices (`offset = d`, `path = index >> d`).
///
/// `siblings[i]` is compared against the zero-subtree root at level
/// `offset + i`, and the binding proof uses the zero-subtree root at level
/// `offset` as the starting node.
pub(crate) fn starting_node_proof<H: Hasher>(
    hasher: &H,
    root: [u8; 32],
    offset: u8,
    path: u64,
    siblings: &[[u8; 32]],
) -> bool {
    let zeroes = &hasher.pre_hashed_zero()[offset as usize..];
    // Exactly one sibling per level above the starting node.
    if siblings.len() + 1 != zeroes.len() {
        return false;
    }
    let mut p = path;
    for (i, sibling) in siblings.iter().enumerate() {
        if p & 1 == 0 {
            if sibling != &zeroes[i] {
                return false;
            }
        } else if sibling == &zeroes[i] {
            return false;
        }
        p >>= 1;
    }
    merkle_proof(hasher, root, zeroes[0], path, siblings)
}
