//! Host persistence boundary: byte layout of a split roll-up and a
//! minimal key-value abstraction to park it in.
//!
//! The engine has no storage of its own. A host hands it a `RollUpStore`
//! (typically a thin adapter over its transactional KV store) and the
//! accumulator serializes itself into a single record.

use crate::split::CachedSiblings;
use crate::{Result, RollUpError, SplitRollUp, Tree};

/// Abstraction over key-value storage for split roll-up records.
///
/// `put` takes `&self` (not `&mut self`) so adapters over batch-based
/// transactional storage can use interior mutability.
pub trait RollUpStore {
    /// Read the record stored under `key`, if any.
    fn get(&self, key: &[u8]) -> core::result::Result<Option<Vec<u8>>, String>;
    /// Write `value` under `key`.
    fn put(&self, key: &[u8], value: &[u8]) -> core::result::Result<(), String>;
}

/// Storage key for the split roll-up with the given id.
///
/// Format: `b"split" + id(8 BE)`.
pub fn split_roll_up_key(id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(13);
    key.extend_from_slice(b"split");
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Serialization flag: no cached siblings follow.
const NO_SIBLINGS_FLAG: u8 = 0x00;
/// Serialization flag: cached siblings follow.
const SIBLINGS_FLAG: u8 = 0x01;

impl SplitRollUp {
    /// Serialize to bytes.
    ///
    /// Format:
    /// ```text
    /// start.root:    [u8; 32]
    /// start.index:   u64 BE
    /// result.root:   [u8; 32]
    /// result.index:  u64 BE
    /// merged_leaves: [u8; 32]
    /// has_siblings:  u8 (0x00 = none, 0x01 = cached)
    /// If cached:
    ///   sub_tree_depth: u8
    ///   level_count:    u8
    ///   nodes:          [level_count × 32 bytes]
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(113);
        buf.extend_from_slice(&self.start.serialize());
        buf.extend_from_slice(&self.result.serialize());
        buf.extend_from_slice(&self.merged_leaves);
        match &self.siblings {
            None => buf.push(NO_SIBLINGS_FLAG),
            Some(cached) => {
                buf.push(SIBLINGS_FLAG);
                buf.push(cached.sub_tree_depth);
                buf.push(cached.nodes.len() as u8);
                for node in &cached.nodes {
                    buf.extend_from_slice(node);
                }
            }
        }
        buf
    }

    /// Deserialize from the layout produced by [`SplitRollUp::serialize`].
    ///
    /// Rejects truncated input and trailing bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < 113 {
            return Err(RollUpError::InvalidData(format!(
                "split roll-up record expected at least 113 bytes, got {}",
                data.len()
            )));
        }
        let start = Tree::deserialize(&data[0..40])?;
        let result = Tree::deserialize(&data[40..80])?;
        let mut merged_leaves = [0u8; 32];
        merged_leaves.copy_from_slice(&data[80..112]);

        let siblings = match data[112] {
            NO_SIBLINGS_FLAG => {
                if data.len() != 113 {
                    return Err(RollUpError::InvalidData(format!(
                        "split roll-up record has {} trailing bytes",
                        data.len() - 113
                    )));
                }
                None
            }
            SIBLINGS_FLAG => {
                if data.len() < 115 {
                    return Err(RollUpError::InvalidData(
                        "truncated siblings header".into(),
                    ));
                }
                let sub_tree_depth = data[113];
                let level_count = data[114] as usize;
                let expected = 115 + level_count * 32;
                if data.len() != expected {
                    return Err(RollUpError::InvalidData(format!(
                        "split roll-up record expected {} bytes, got {}",
                        expected,
                        data.len()
                    )));
                }
                let mut nodes = Vec::with_capacity(level_count);
                for i in 0..level_count {
                    let at = 115 + i * 32;
                    let mut node = [0u8; 32];
                    node.copy_from_slice(&data[at..at + 32]);
                    nodes.push(node);
                }
                Some(CachedSiblings {
                    sub_tree_depth,
                    nodes,
                })
            }
            flag => {
                return Err(RollUpError::InvalidData(format!(
                    "invalid siblings flag: 0x{:02x}",
                    flag
                )));
            }
        };

        Ok(SplitRollUp {
            start,
            result,
            merged_leaves,
            siblings,
        })
    }

    /// Persist this accumulator under `split_roll_up_key(id)`.
    pub fn save<S: RollUpStore>(&self, store: &S, id: u64) -> Result<()> {
        store
            .put(&split_roll_up_key(id), &self.serialize())
            .map_err(|e| RollUpError::StorageError(format!("put split roll-up failed: {}", e)))
    }

    /// Load the accumulator stored under `split_roll_up_key(id)`, if any.
    pub fn load<S: RollUpStore>(store: &S, id: u64) -> Result<Option<Self>> {
        let record = store
            .get(&split_roll_up_key(id))
            .map_err(|e| RollUpError::StorageError(format!("get split roll-up failed: {}", e)))?;
        record.map(|bytes| Self::deserialize(&bytes)).transpose()
    }
}

/// In-memory store for tests and host integration experiments.
///
/// Immediate reads and writes backed by a `HashMap`.
#[cfg(any(test, feature = "mem_store"))]
#[derive(Default)]
pub struct MemRollUpStore {
    data: std::cell::RefCell<std::collections::HashMap<Vec<u8>, Vec<u8>>>,
}

#[cfg(any(test, feature = "mem_store"))]
impl MemRollUpStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(any(test, feature = "mem_store"))]
impl RollUpStore for MemRollUpStore {
    fn get(&self, key: &[u8]) -> core::result::Result<Option<Vec<u8>>, String> {
        Ok(self.data.borrow().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> core::result::Result<(), String> {
        self.data
            .borrow_mut()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
