//! Sub-tree roll-up: bulk insertion at `2^d` granularity.
//!
//! Instead of hashing a full depth-`D` path per leaf, leaves are grouped
//! into depth-`d` sub-trees whose roots are spliced into the main tree at
//! `2^d`-aligned indices, so only one `D - d` deep path is hashed per
//! group. The sub-tree root computation prunes entirely-empty subtrees,
//! which is where the hash saving comes from when groups are partial.

use crate::{Hasher, Result, RollUpError};

use super::{starting_node_proof, RollUpOutcome, Tree};

/// Split `leaves` into `2^d`-sized groups, left-to-right, right-padding
/// the final group with zero leaves.
///
/// Returns `⌈|leaves| / 2^d⌉` groups; an empty input yields no groups.
pub fn split_to_sub_trees(leaves: &[[u8; 32]], sub_tree_depth: u8) -> Vec<Vec<[u8; 32]>> {
    let size = 1usize << sub_tree_depth;
    leaves
        .chunks(size)
        .map(|chunk| {
            let mut sub_tree = chunk.to_vec();
            sub_tree.resize(size, [0u8; 32]);
            sub_tree
        })
        .collect()
}

/// Compute a depth-`d` Merkle root over up to `2^d` leaves.
///
/// Missing trailing leaves are treated as zero. Equals the root obtained
/// by right-padding `leaves` to `2^d` and hashing every pair, but resolves
/// entirely-empty subtrees from the pre-hashed zero table without calling
/// `parent_of`.
pub fn sub_tree_root<H: Hasher>(
    hasher: &H,
    sub_tree_depth: u8,
    leaves: &[[u8; 32]],
) -> Result<[u8; 32]> {
    sub_tree_root_with_count(hasher, sub_tree_depth, leaves).map(|(root, _)| root)
}

/// [`sub_tree_root`] variant that also reports the number of `parent_of`
/// calls performed.
///
/// Bottom-up sweep over a heap-ordered buffer: node 1 is the sub-tree
/// root, node `2i`/`2i + 1` are the children of `i`, and the leaves occupy
/// nodes `2^d .. 2^d + |leaves|`. A parent whose heap index exceeds the
/// per-level shift of the last occupied leaf node heads an entirely-empty
/// subtree and resolves to the pre-hashed zero of its level.
pub(crate) fn sub_tree_root_with_count<H: Hasher>(
    hasher: &H,
    sub_tree_depth: u8,
    leaves: &[[u8; 32]],
) -> Result<([u8; 32], u32)> {
    let zeroes = hasher.pre_hashed_zero();
    if sub_tree_depth > hasher.depth() {
        return Err(RollUpError::InvalidInput(format!(
            "sub-tree depth {} exceeds tree depth {}",
            sub_tree_depth,
            hasher.depth()
        )));
    }
    let tree_size = 1usize << sub_tree_depth;
    if leaves.len() > tree_size {
        return Err(RollUpError::InvalidInput(format!(
            "{} leaves exceed sub-tree capacity {}",
            leaves.len(),
            tree_size
        )));
    }
    if leaves.is_empty() {
        return Ok((zeroes[sub_tree_depth as usize], 0));
    }

    let mut nodes = vec![[0u8; 32]; tree_size << 1];
    nodes[tree_size..tree_size + leaves.len()].copy_from_slice(leaves);
    // Heap index of the last occupied node at the leaf level.
    let last_occupied = (tree_size + leaves.len() - 1) as u64;

    let mut hash_count = 0u32;
    for level in 0..sub_tree_depth as usize {
        let first_parent = tree_size >> (level + 1);
        let threshold = last_occupied >> (level + 1);
        for parent in first_parent..(first_parent << 1) {
            if (parent as u64) > threshold {
                nodes[parent] = zeroes[level + 1];
            } else {
                nodes[parent] =
                    hasher.parent_of(&nodes[parent << 1], &nodes[(parent << 1) | 1]);
                hash_count += 1;
            }
        }
    }
    Ok((nodes[1], hash_count))
}

/// Splice a sub-tree root at `index`, updating the `D - d` deep frontier
/// in place. Same walk as a single-leaf append, offset by `d` levels.
pub(crate) fn append_sub_tree_root<H: Hasher>(
    hasher: &H,
    index: u64,
    sub_tree_depth: u8,
    sub_root: [u8; 32],
    siblings: &mut [[u8; 32]],
) -> [u8; 32] {
    let zeroes = &hasher.pre_hashed_zero()[sub_tree_depth as usize..];
    let mut node = sub_root;
    let mut path = index >> sub_tree_depth;
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

/// Append a batch of leaves as depth-`d` sub-trees.
///
/// `index` must be a multiple of `2^d` and `siblings` must be the length
/// `D - d` frontier of the sub-tree layer. The batch size is rounded up
/// to the next multiple of `2^d`: a partial final group still occupies a
/// whole sub-tree slot (its missing leaves are zero).
pub fn roll_up_sub_trees<H: Hasher>(
    hasher: &H,
    prev_root: [u8; 32],
    index: u64,
    sub_tree_depth: u8,
    leaves: &[[u8; 32]],
    initial_siblings: &[[u8; 32]],
) -> Result<RollUpOutcome> {
    let depth = hasher.depth();
    if sub_tree_depth > depth {
        return Err(RollUpError::InvalidInput(format!(
            "sub-tree depth {} exceeds tree depth {}",
            sub_tree_depth, depth
        )));
    }
    let sub_tree_size = 1u64 << sub_tree_depth;
    if index % sub_tree_size != 0 {
        return Err(RollUpError::UnalignedIndex {
            index,
            sub_tree_size,
        });
    }

    let capacity = Tree::capacity(depth);
    let num_sub_trees = (leaves.len() as u64).div_ceil(sub_tree_size);
    let end = num_sub_trees
        .checked_mul(sub_tree_size)
        .and_then(|appended| index.checked_add(appended))
        .filter(|end| *end <= capacity)
        .ok_or(RollUpError::TreeFull { capacity, index })?;

    if !starting_node_proof(
        hasher,
        prev_root,
        sub_tree_depth,
        index >> sub_tree_depth,
        initial_siblings,
    ) {
        return Err(RollUpError::InvalidStartingProof { index });
    }

    let mut siblings = initial_siblings.to_vec();
    let mut root = prev_root;
    let mut next = index;
    let mut hash_count = 0u32;
    for chunk in leaves.chunks(sub_tree_size as usize) {
        let (sub_root, count) = sub_tree_root_with_count(hasher, sub_tree_depth, chunk)?;
        root = append_sub_tree_root(hasher, next, sub_tree_depth, sub_root, &mut siblings);
        next += sub_tree_size;
        hash_count += count + (depth - sub_tree_depth) as u32;
    }
    debug_assert_eq!(next, end);

    Ok(RollUpOutcome {
        root,
        index: end,
        hash_count,
    })
}
