//! Split roll-up accumulator and optimistic roll-up claims.
//!
//! A split roll-up decouples *proving that leaves were appended in a
//! specific order* from *doing the hashing*: an accumulator advances the
//! tree across many calls while folding every appended leaf into a rolling
//! keccak digest, and is finally compared against an off-chain claim.

mod merge;


pub use merge::{merge_leaves, merge_result, merge_sub_trees, sub_tree_hash, MergeResult};

use crate::tree::{
    append_leaf, append_sub_tree_root, roll_up, roll_up_sub_trees, starting_leaf_proof,
    starting_node_proof, sub_tree_root_with_count, Tree,
};
use crate::{Hasher, Result, RollUpError};

/// An optimistic roll-up claim from an off-chain prover.
///
/// Immutable: `(start, result, merged_leaves)` describe a finished roll-up
/// to be checked against a [`SplitRollUp`] that replayed the same appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opru {
    /// Tree state the roll-up started from.
    pub start: Tree,
    /// Claimed tree state after the roll-up.
    pub result: Tree,
    /// Claimed rolling digest of the appended leaf sequence.
    pub merged_leaves: [u8; 32],
}

impl Opru {
    /// Claim for appending `leaves` one by one from `start`.
    pub fn from_leaves(start: Tree, result_root: [u8; 32], leaves: &[[u8; 32]]) -> Self {
        Opru {
            start,
            result: Tree {
                root: result_root,
                index: start.index + leaves.len() as u64,
            },
            merged_leaves: merge_leaves([0u8; 32], leaves),
        }
    }

    /// Claim for appending `leaves` as depth-`d` sub-trees from `start`.
    ///
    /// The result index is rounded up to the next multiple of `2^d` and
    /// the digest folds padded sub-tree hashes, so this claim can only be
    /// met by a sub-tree mode accumulator.
    pub fn from_sub_trees(
        start: Tree,
        result_root: [u8; 32],
        sub_tree_depth: u8,
        leaves: &[[u8; 32]],
    ) -> Self {
        let sub_tree_size = 1u64 << sub_tree_depth;
        let appended = (leaves.len() as u64).div_ceil(sub_tree_size) * sub_tree_size;
        Opru {
            start,
            result: Tree {
                root: result_root,
                index: start.index + appended,
            },
            merged_leaves: merge_sub_trees([0u8; 32], leaves, sub_tree_depth),
        }
    }
}

/// Frontier cached by the sibling-initialized variants.
///
/// `sub_tree_depth` 0 means leaf granularity; the nodes vector then has
/// one entry per tree level. In sub-tree mode it has `D - d` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CachedSiblings {
    pub(crate) sub_tree_depth: u8,
    pub(crate) nodes: Vec<[u8; 32]>,
}

/// Persistent accumulator for a roll-up spanning multiple calls.
///
/// Exactly one logical actor owns an accumulator; the host's transaction
/// sequencing totally orders operations on it. Failed operations never
/// advance the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRollUp {
    /// Tree state the roll-up started from. Fixed at init.
    pub start: Tree,
    /// Tree state after the appends performed so far.
    pub result: Tree,
    /// Rolling digest of exactly the leaves appended since `start`.
    pub merged_leaves: [u8; 32],
    pub(crate) siblings: Option<CachedSiblings>,
}

impl SplitRollUp {
    /// Start an accumulator at `(root, index)` without caching a frontier.
    ///
    /// Every subsequent update must carry its own siblings and pays a
    /// starting-leaf verification ([`SplitRollUp::update_with_proof`]).
    pub fn init(root: [u8; 32], index: u64) -> Self {
        let tree = Tree { root, index };
        SplitRollUp {
            start: tree,
            result: tree,
            merged_leaves: [0u8; 32],
            siblings: None,
        }
    }

    /// Start an accumulator and cache the frontier after verifying it once.
    ///
    /// Later [`SplitRollUp::update`] calls trust the cached frontier and
    /// skip re-verification, trading one up-front proof for cheaper
    /// updates.
    pub fn init_with_siblings<H: Hasher>(
        hasher: &H,
        root: [u8; 32],
        index: u64,
        siblings: Vec<[u8; 32]>,
    ) -> Result<Self> {
        if !starting_leaf_proof(hasher, root, index, &siblings) {
            return Err(RollUpError::InvalidStartingProof { index });
        }
        let mut split = Self::init(root, index);
        split.siblings = Some(CachedSiblings {
            sub_tree_depth: 0,
            nodes: siblings,
        });
        Ok(split)
    }

    /// Start a sub-tree granularity accumulator with a cached frontier.
    ///
    /// `siblings` is the `D - d` deep frontier of the sub-tree layer;
    /// `index` must be `2^d` aligned.
    pub fn init_with_sub_tree_siblings<H: Hasher>(
        hasher: &H,
        root: [u8; 32],
        index: u64,
        sub_tree_depth: u8,
        siblings: Vec<[u8; 32]>,
    ) -> Result<Self> {
        if sub_tree_depth > hasher.depth() {
            return Err(RollUpError::InvalidInput(format!(
                "sub-tree depth {} exceeds tree depth {}",
                sub_tree_depth,
                hasher.depth()
            )));
        }
        let sub_tree_size = 1u64 << sub_tree_depth;
        if index % sub_tree_size != 0 {
            return Err(RollUpError::UnalignedIndex {
                index,
                sub_tree_size,
            });
        }
        if !starting_node_proof(hasher, root, sub_tree_depth, index >> sub_tree_depth, &siblings)
        {
            return Err(RollUpError::InvalidStartingProof { index });
        }
        let mut split = Self::init(root, index);
        split.siblings = Some(CachedSiblings {
            sub_tree_depth,
            nodes: siblings,
        });
        Ok(split)
    }

    /// The cached frontier, if this accumulator was sibling-initialized.
    pub fn cached_siblings(&self) -> Option<&[[u8; 32]]> {
        self.siblings.as_ref().map(|cached| cached.nodes.as_slice())
    }

    /// Append `leaves` with caller-supplied siblings (proof per update).
    ///
    /// Performs a fresh [`roll_up`], re-verifying the starting-leaf proof
    /// against the current result state, then folds the leaves into the
    /// digest. Returns the number of `parent_of` calls.
    ///
    /// Not available on a sibling-initialized accumulator: advancing the
    /// tree without the cached frontier would leave it stale.
    pub fn update_with_proof<H: Hasher>(
        &mut self,
        hasher: &H,
        initial_siblings: &[[u8; 32]],
        leaves: &[[u8; 32]],
    ) -> Result<u32> {
        if self.siblings.is_some() {
            return Err(RollUpError::InvalidInput(
                "accumulator caches siblings; use update".into(),
            ));
        }
        let outcome = roll_up(
            hasher,
            self.result.root,
            self.result.index,
            leaves,
            initial_siblings,
        )?;
        self.result = Tree {
            root: outcome.root,
            index: outcome.index,
        };
        self.merged_leaves = merge_leaves(self.merged_leaves, leaves);
        Ok(outcome.hash_count)
    }

    /// Append `leaves` as sub-trees with caller-supplied siblings.
    ///
    /// Sub-tree counterpart of [`SplitRollUp::update_with_proof`]: a fresh
    /// [`roll_up_sub_trees`] per call, digest folded over padded sub-tree
    /// hashes.
    pub fn update_sub_trees_with_proof<H: Hasher>(
        &mut self,
        hasher: &H,
        sub_tree_depth: u8,
        initial_siblings: &[[u8; 32]],
        leaves: &[[u8; 32]],
    ) -> Result<u32> {
        if self.siblings.is_some() {
            return Err(RollUpError::InvalidInput(
                "accumulator caches siblings; use update_sub_trees".into(),
            ));
        }
        let outcome = roll_up_sub_trees(
            hasher,
            self.result.root,
            self.result.index,
            sub_tree_depth,
            leaves,
            initial_siblings,
        )?;
        self.result = Tree {
            root: outcome.root,
            index: outcome.index,
        };
        self.merged_leaves = merge_sub_trees(self.merged_leaves, leaves, sub_tree_depth);
        Ok(outcome.hash_count)
    }

    /// Append `leaves` using the cached frontier (no re-verification).
    ///
    /// Trust assumption: the frontier was verified once at
    /// [`SplitRollUp::init_with_siblings`] and only this accumulator
    /// mutates it afterwards, so it is not re-checked against
    /// `result.root` on each call. Returns the number of `parent_of`
    /// calls.
    pub fn update<H: Hasher>(&mut self, hasher: &H, leaves: &[[u8; 32]]) -> Result<u32> {
        let depth = hasher.depth();
        let capacity = Tree::capacity(depth);
        let index = self.result.index;
        let cached = self
            .siblings
            .as_mut()
            .ok_or(RollUpError::SiblingsNotInitialized)?;
        if cached.sub_tree_depth != 0 {
            return Err(RollUpError::InvalidInput(
                "accumulator is in sub-tree mode; use update_sub_trees".into(),
            ));
        }
        if cached.nodes.len() != depth as usize {
            return Err(RollUpError::InvalidInput(format!(
                "cached frontier has {} levels but the hasher serves depth {}",
                cached.nodes.len(),
                depth
            )));
        }
        let end = index
            .checked_add(leaves.len() as u64)
            .filter(|end| *end <= capacity)
            .ok_or(RollUpError::TreeFull { capacity, index })?;

        let mut root = self.result.root;
        for (i, leaf) in leaves.iter().enumerate() {
            root = append_leaf(hasher, index + i as u64, *leaf, &mut cached.nodes);
        }
        self.result = Tree { root, index: end };
        self.merged_leaves = merge_leaves(self.merged_leaves, leaves);
        Ok(depth as u32 * leaves.len() as u32)
    }

    /// Append `leaves` as sub-trees using the cached frontier.
    ///
    /// Requires [`SplitRollUp::init_with_sub_tree_siblings`]; uses the
    /// cached sub-tree depth. The batch size rounds up to a whole number
    /// of sub-trees and the digest folds padded sub-tree hashes.
    pub fn update_sub_trees<H: Hasher>(
        &mut self,
        hasher: &H,
        leaves: &[[u8; 32]],
    ) -> Result<u32> {
        let depth = hasher.depth();
        let capacity = Tree::capacity(depth);
        let index = self.result.index;

        let cached = self
            .siblings
            .as_ref()
            .ok_or(RollUpError::SiblingsNotInitialized)?;
        let sub_tree_depth = cached.sub_tree_depth;
        if sub_tree_depth > depth {
            return Err(RollUpError::InvalidInput(format!(
                "cached sub-tree depth {} exceeds tree depth {}",
                sub_tree_depth, depth
            )));
        }
        let sub_tree_size = 1u64 << sub_tree_depth;
        let end = (leaves.len() as u64)
            .div_ceil(sub_tree_size)
            .checked_mul(sub_tree_size)
            .and_then(|appended| index.checked_add(appended))
            .filter(|end| *end <= capacity)
            .ok_or(RollUpError::TreeFull { capacity, index })?;
        if cached.nodes.len() != (depth - sub_tree_depth) as usize {
            return Err(RollUpError::InvalidInput(format!(
                "cached frontier has {} levels, expected {} for depth {} at sub-tree depth {}",
                cached.nodes.len(),
                depth - sub_tree_depth,
                depth,
                sub_tree_depth
            )));
        }

        // Pre-compute all sub-tree roots so no error can interrupt the
        // frontier mutation below.
        let mut sub_roots = Vec::with_capacity(leaves.len() / sub_tree_size as usize + 1);
        let mut hash_count = 0u32;
        for chunk in leaves.chunks(sub_tree_size as usize) {
            let (sub_root, count) = sub_tree_root_with_count(hasher, sub_tree_depth, chunk)?;
            sub_roots.push(sub_root);
            hash_count += count + (depth - sub_tree_depth) as u32;
        }

        let cached = self
            .siblings
            .as_mut()
            .ok_or(RollUpError::SiblingsNotInitialized)?;
        let mut root = self.result.root;
        let mut next = index;
        for sub_root in sub_roots {
            root = append_sub_tree_root(hasher, next, sub_tree_depth, sub_root, &mut cached.nodes);
            next += sub_tree_size;
        }
        debug_assert_eq!(next, end);
        self.result = Tree { root, index: end };
        self.merged_leaves = merge_sub_trees(self.merged_leaves, leaves, sub_tree_depth);
        Ok(hash_count)
    }

    /// Compare this accumulator against an optimistic claim.
    ///
    /// Start state, digest, and result index must match exactly; a
    /// mismatch there means the claim talks about a different roll-up and
    /// is a typed error. The root comparison is the verification outcome.
    pub fn verify(&self, opru: &Opru) -> Result<bool> {
        if self.start.root != opru.start.root {
            return Err(RollUpError::VerifyMismatch("start root"));
        }
        if self.start.index != opru.start.index {
            return Err(RollUpError::VerifyMismatch("start index"));
        }
        if self.merged_leaves != opru.merged_leaves {
            return Err(RollUpError::VerifyMismatch("merged leaves"));
        }
        if self.result.index != opru.result.index {
            return Err(RollUpError::VerifyMismatch("result index"));
        }
        Ok(self.result.root == opru.result.root)
    }
}
