//! Even-level nodes: the low-nybble half of a byte dispatch.

use std::sync::Arc;

use super::bytenode::ByteNode;
use super::directory::Directory;

/// Completes the byte split started by a `ByteNode`.
///
/// A `NybbleNode` is purely structural: it holds no prefix, value, or size of
/// its own, only a directory from low nybbles to the `ByteNode`s one byte
/// further down the key. A `NybbleNode` with an empty directory must never
/// exist; when its last child goes away the parent `ByteNode` drops the whole
/// entry instead.
#[derive(Debug)]
pub(crate) struct NybbleNode<V> {
    pub(crate) dir: Directory<Arc<ByteNode<V>>>,
}

impl<V> NybbleNode<V> {
    pub(crate) fn single(low: u8, child: Arc<ByteNode<V>>) -> Self {
        NybbleNode {
            dir: Directory::single(low, child),
        }
    }

    pub(crate) fn pair(a: u8, a_child: Arc<ByteNode<V>>, b: u8, b_child: Arc<ByteNode<V>>) -> Self {
        NybbleNode {
            dir: Directory::pair(a, a_child, b, b_child),
        }
    }

    pub(crate) fn get(&self, low: u8) -> Option<&Arc<ByteNode<V>>> {
        self.dir.get(low)
    }

    /// The only entry, if this node has exactly one.
    pub(crate) fn sole_entry(&self) -> Option<(u8, &Arc<ByteNode<V>>)> {
        if self.dir.len() == 1 {
            Some((self.dir.key_at(0), self.dir.child_at(0)))
        } else {
            None
        }
    }
}
