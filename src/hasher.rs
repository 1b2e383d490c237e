//! Pluggable two-to-one hashers and the pre-hashed zero table.
//!
//! The tree hash is a capability: anything that can combine two 32-byte
//! children into a parent and serve the roots of perfectly-empty subtrees
//! works. [`KeccakHasher`] is the interoperable default; [`Blake3Hasher`]
//! is a cheap alternative mostly used by tests and benchmarks.
//!
//! The rolling leaf digest of the split roll-up is *not* pluggable: it is
//! keccak-256 regardless of the tree hasher (see [`keccak256`]), so that
//! accumulators interoperate with external optimistic roll-up provers.

use tiny_keccak::{Hasher as _, Keccak};

use crate::{Result, RollUpError};

/// Capability supplying the binary parent hash and the pre-hashed zero
/// table of an append-only Merkle tree.
///
/// Implementations must be deterministic and pure. The zero table fixes
/// the tree depth: a table of `depth + 1` entries serves a `depth`-deep
/// tree, so a hasher and the trees it drives can never disagree on depth.
pub trait Hasher {
    /// Compute the parent node of two children.
    fn parent_of(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32];

    /// Roots of perfectly-empty subtrees, bottom-up.
    ///
    /// Entry 0 is the zero leaf and entry `i + 1` equals
    /// `parent_of(entry[i], entry[i])`. The last entry is the root of a
    /// fully empty tree.
    fn pre_hashed_zero(&self) -> &[[u8; 32]];

    /// Tree depth served by this hasher.
    fn depth(&self) -> u8 {
        (self.pre_hashed_zero().len() - 1) as u8
    }
}

/// Validate that a tree depth is in the allowed range [1, 63].
///
/// Depths above 63 would overflow `u64` index arithmetic.
pub(crate) fn validate_depth(depth: u8) -> Result<()> {
    if !(1..=63).contains(&depth) {
        return Err(RollUpError::InvalidInput(format!(
            "depth must be between 1 and 63, got {}",
            depth
        )));
    }
    Ok(())
}

/// Build the pre-hashed zero table for `depth` levels from a parent
/// function: `Z[0] = 0`, `Z[i + 1] = parent(Z[i], Z[i])`.
fn pre_hashed_zero_table(
    depth: u8,
    parent: impl Fn(&[u8; 32], &[u8; 32]) -> [u8; 32],
) -> Vec<[u8; 32]> {
    let mut table = Vec::with_capacity(depth as usize + 1);
    table.push([0u8; 32]);
    for i in 0..depth as usize {
        let z = table[i];
        table.push(parent(&z, &z));
    }
    table
}

/// Keccak-256 of arbitrary bytes.
///
/// Used for `parent_of` in [`KeccakHasher`] and, fixed by the wire format,
/// for the rolling `merged_leaves` digest of the split roll-up.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Keccak-256 parent: `keccak256(left || right)` over 64 bytes.
fn keccak_parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(left);
    hasher.update(right);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Keccak-256 tree hasher with a precomputed zero table.
///
/// Parent nodes are `keccak256(left || right)`. This is the hasher whose
/// zero chain matches the widely deployed keccak Merkle trees (e.g. the
/// depth-32 deposit tree), so roots interoperate with external verifiers.
#[derive(Debug, Clone)]
pub struct KeccakHasher {
    pre_hashed_zero: Vec<[u8; 32]>,
}

impl KeccakHasher {
    /// Create a keccak hasher for a tree of the given depth.
    ///
    /// Computes the `depth + 1` entry zero table up front. Depth must be
    /// between 1 and 63 inclusive.
    pub fn new(depth: u8) -> Result<Self> {
        validate_depth(depth)?;
        Ok(Self {
            pre_hashed_zero: pre_hashed_zero_table(depth, keccak_parent),
        })
    }
}

impl Hasher for KeccakHasher {
    fn parent_of(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        keccak_parent(left, right)
    }

    fn pre_hashed_zero(&self) -> &[[u8; 32]] {
        &self.pre_hashed_zero
    }
}

/// Blake3 tree hasher with a precomputed zero table.
///
/// Parent nodes are `blake3(left || right)`. An order of magnitude cheaper
/// than keccak; roots are NOT interoperable with keccak-based verifiers.
#[derive(Debug, Clone)]
pub struct Blake3Hasher {
    pre_hashed_zero: Vec<[u8; 32]>,
}

impl Blake3Hasher {
    /// Create a blake3 hasher for a tree of the given depth.
    pub fn new(depth: u8) -> Result<Self> {
        validate_depth(depth)?;
        Ok(Self {
            pre_hashed_zero: pre_hashed_zero_table(depth, blake3_parent),
        })
    }
}

impl Hasher for Blake3Hasher {
    fn parent_of(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        blake3_parent(left, right)
    }

    fn pre_hashed_zero(&self) -> &[[u8; 32]] {
        &self.pre_hashed_zero
    }
}

/// Blake3 parent: `blake3(left || right)` over 64 bytes.
fn blake3_parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(left);
    input[32..].copy_from_slice(right);
    *blake3::hash(&input).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty_input() {
        // keccak256(""), the canonical empty-input digest
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak_zero_table_known_entries() {
        let hasher = KeccakHasher::new(3).expect("create keccak hasher");
        let zeroes = hasher.pre_hashed_zero();
        assert_eq!(zeroes[0], [0u8; 32]);
        // keccak256(0^64), level 1 of the canonical keccak zero chain
        assert_eq!(
            hex::encode(zeroes[1]),
            "ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
        assert_eq!(
            hex::encode(zeroes[2]),
            "b4c11951957c6f8f642c4af61cd6b24640fec6dc7fc607ee8206a99e92410d30"
        );
    }

    #[test]
    fn test_zero_table_chain_invariant() {
        let hasher = KeccakHasher::new(16).expect("create keccak hasher");
        let zeroes = hasher.pre_hashed_zero();
        assert_eq!(zeroes.len(), 17);
        for i in 0..16 {
            assert_eq!(
                zeroes[i + 1],
                hasher.parent_of(&zeroes[i], &zeroes[i]),
                "zero chain broken at level {}",
                i
            );
        }
    }

    #[test]
    fn test_blake3_zero_table_chain_invariant() {
        let hasher = Blake3Hasher::new(8).expect("create blake3 hasher");
        let zeroes = hasher.pre_hashed_zero();
        assert_eq!(zeroes.len(), 9);
        for i in 0..8 {
            assert_eq!(zeroes[i + 1], hasher.parent_of(&zeroes[i], &zeroes[i]));
        }
    }

    #[test]
    fn test_blake3_parent_matches_plain_hash() {
        let hasher = Blake3Hasher::new(4).expect("create blake3 hasher");
        let left = [0xAAu8; 32];
        let right = [0xBBu8; 32];

        let mut input = [0u8; 64];
        input[..32].copy_from_slice(&left);
        input[32..].copy_from_slice(&right);
        let expected = *blake3::hash(&input).as_bytes();

        assert_eq!(hasher.parent_of(&left, &right), expected);
    }

    #[test]
    fn test_depth_derived_from_table_length() {
        let hasher = KeccakHasher::new(31).expect("create keccak hasher");
        assert_eq!(hasher.depth(), 31);
        assert_eq!(hasher.pre_hashed_zero().len(), 32);
    }

    #[test]
    fn test_depth_zero_rejected() {
        assert!(KeccakHasher::new(0).is_err());
        assert!(Blake3Hasher::new(0).is_err());
    }

    #[test]
    fn test_depth_above_63_rejected() {
        assert!(KeccakHasher::new(64).is_err());
    }

    #[test]
    fn test_parent_of_is_order_sensitive() {
        let hasher = KeccakHasher::new(2).expect("create keccak hasher");
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(hasher.parent_of(&a, &b), hasher.parent_of(&b, &a));
    }
}
