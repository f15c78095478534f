//! Odd-level nodes: prefix compression, stored values, high-nybble dispatch.

use std::sync::Arc;

use super::directory::Directory;
use super::nybblenode::NybbleNode;
use super::Edit;

#[inline]
pub(crate) fn high(byte: u8) -> u8 {
    byte >> 4
}

#[inline]
pub(crate) fn low(byte: u8) -> u8 {
    byte & 0x0F
}

#[inline]
pub(crate) fn join(high: u8, low: u8) -> u8 {
    (high << 4) | low
}

pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// A node at a byte boundary of the key space.
///
/// The `prefix` holds the bytes every key in this subtree shares beyond the
/// parent's position; path compression guarantees that a valueless node with
/// only a single reachable grandchild never exists, so chains of single-child
/// nodes collapse into one prefix. `size` counts the values stored in the
/// subtree and is maintained incrementally by every rebuild; a node whose
/// subtree would hold zero values is never materialised.
///
/// Descent consumes the prefix byte-for-byte, then splits the next key byte:
/// the high nybble selects a [`NybbleNode`] from `dir`, the low nybble selects
/// the next `ByteNode` inside it.
#[derive(Debug)]
pub(crate) struct ByteNode<V> {
    pub(crate) prefix: Box<[u8]>,
    pub(crate) value: Option<V>,
    pub(crate) size: usize,
    pub(crate) dir: Directory<Arc<NybbleNode<V>>>,
}

/// What a recursive update did to a subtree.
pub(crate) enum Outcome<V> {
    /// Nothing changed; the caller keeps its existing child pointer.
    Same,
    /// The subtree was rebuilt along the spine.
    Node(Arc<ByteNode<V>>),
    /// The last value in the subtree was removed.
    Removed,
}

impl<V> ByteNode<V> {
    pub(crate) fn get<'a>(&'a self, key: &[u8], at: usize) -> Option<&'a V> {
        let rest = &key[at..];
        if rest.len() < self.prefix.len() || rest[..self.prefix.len()] != *self.prefix {
            return None;
        }
        if rest.len() == self.prefix.len() {
            return self.value.as_ref();
        }
        let byte = rest[self.prefix.len()];
        let even = self.dir.get(high(byte))?;
        let child = even.get(low(byte))?;
        child.get(key, at + self.prefix.len() + 1)
    }

    /// Number of entries whose key starts with `prefix`, answered from the
    /// maintained subtree sizes without touching values.
    pub(crate) fn count_prefixed(&self, prefix: &[u8], at: usize) -> usize {
        let rest = &prefix[at..];
        let overlap = common_prefix_len(&self.prefix, rest);
        if overlap == rest.len() {
            return self.size;
        }
        if overlap < self.prefix.len() {
            return 0;
        }
        let byte = rest[self.prefix.len()];
        match self.dir.get(high(byte)).and_then(|even| even.get(low(byte))) {
            Some(child) => child.count_prefixed(prefix, at + self.prefix.len() + 1),
            None => 0,
        }
    }

    /// The single grandchild and its dispatch byte, when this node has
    /// exactly one.
    fn sole_grandchild(&self) -> Option<(u8, &Arc<ByteNode<V>>)> {
        if self.dir.len() != 1 {
            return None;
        }
        let (lo, child) = self.dir.child_at(0).sole_entry()?;
        Some((join(self.dir.key_at(0), lo), child))
    }

    /// Structural self-check, recursing over the whole subtree.
    ///
    /// Verifies directory ordering and nybble ranges, the size accounting,
    /// that no `NybbleNode` is empty, that no subtree is value-free, and the
    /// path-compression rule.
    pub(crate) fn check_invariants(&self) {
        assert!(
            self.value.is_some() || !self.dir.is_empty(),
            "node with neither value nor children"
        );
        assert!(
            self.value.is_some() || self.sole_grandchild().is_none(),
            "valueless node with a single grandchild escaped fusion"
        );

        let mut grandchild_total = 0;
        let mut last_high = None;
        for (hi, even) in self.dir.iter() {
            assert!(hi < 16, "high nybble out of range");
            assert!(last_high < Some(hi), "high nybbles out of order");
            last_high = Some(hi);
            assert!(!even.dir.is_empty(), "empty nybble node");

            let mut last_low = None;
            for (lo, child) in even.dir.iter() {
                assert!(lo < 16, "low nybble out of range");
                assert!(last_low < Some(lo), "low nybbles out of order");
                last_low = Some(lo);
                child.check_invariants();
                grandchild_total += child.size;
            }
        }
        assert_eq!(
            self.size,
            self.value.is_some() as usize + grandchild_total,
            "subtree size out of sync"
        );
    }
}

impl<V: Clone> ByteNode<V> {
    /// A leaf holding exactly one entry.
    pub(crate) fn leaf(suffix: &[u8], value: V) -> Self {
        ByteNode {
            prefix: suffix.into(),
            value: Some(value),
            size: 1,
            dir: Directory::empty(),
        }
    }

    /// Applies `edit` at `key`, rebuilding the spine and nothing else.
    ///
    /// The transformer runs exactly once, against the incumbent value when
    /// the key is present and against nothing when it is absent. `Keep`
    /// always reports [`Outcome::Same`], as do `Remove` of an absent entry
    /// and any edit that declines to materialise a missing key.
    pub(crate) fn update<F>(&self, key: &[u8], at: usize, edit: F) -> Outcome<V>
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        let rest = &key[at..];
        let overlap = common_prefix_len(&self.prefix, rest);

        if overlap < self.prefix.len() {
            if overlap < rest.len() {
                // The key diverges inside this node's prefix.
                let Edit::Put(value) = edit(None) else {
                    return Outcome::Same;
                };
                return Outcome::Node(self.split_diverging(rest, overlap, value));
            }
            // The key ends inside this node's prefix.
            let Edit::Put(value) = edit(None) else {
                return Outcome::Same;
            };
            return Outcome::Node(self.split_shortened(rest, value));
        }

        if overlap == rest.len() {
            // The key ends exactly at this node.
            return match edit(self.value.as_ref()) {
                Edit::Keep => Outcome::Same,
                Edit::Put(value) => {
                    let grown = self.value.is_none() as usize;
                    Outcome::Node(Arc::new(ByteNode {
                        prefix: self.prefix.clone(),
                        value: Some(value),
                        size: self.size + grown,
                        dir: self.dir.clone(),
                    }))
                }
                Edit::Remove => {
                    if self.value.is_none() {
                        return Outcome::Same;
                    }
                    if self.dir.is_empty() {
                        return Outcome::Removed;
                    }
                    Outcome::Node(self.without_value())
                }
            };
        }

        // Prefix fully consumed, key continues: dispatch on the next byte.
        let byte = rest[self.prefix.len()];
        let below = at + self.prefix.len() + 1;

        let even_at = match self.dir.locate(high(byte)) {
            Ok(even_at) => even_at,
            Err(slot) => {
                let Edit::Put(value) = edit(None) else {
                    return Outcome::Same;
                };
                let leaf = Arc::new(ByteNode::leaf(&key[below..], value));
                let even = Arc::new(NybbleNode::single(low(byte), leaf));
                return Outcome::Node(Arc::new(ByteNode {
                    prefix: self.prefix.clone(),
                    value: self.value.clone(),
                    size: self.size + 1,
                    dir: self.dir.inserted(slot, high(byte), even),
                }));
            }
        };
        let even = self.dir.child_at(even_at);

        let child_at = match even.dir.locate(low(byte)) {
            Ok(child_at) => child_at,
            Err(slot) => {
                let Edit::Put(value) = edit(None) else {
                    return Outcome::Same;
                };
                let leaf = Arc::new(ByteNode::leaf(&key[below..], value));
                let grown = Arc::new(NybbleNode {
                    dir: even.dir.inserted(slot, low(byte), leaf),
                });
                return Outcome::Node(Arc::new(ByteNode {
                    prefix: self.prefix.clone(),
                    value: self.value.clone(),
                    size: self.size + 1,
                    dir: self.dir.replaced(even_at, grown),
                }));
            }
        };
        let child = even.dir.child_at(child_at);

        match child.update(key, below, edit) {
            Outcome::Same => Outcome::Same,
            Outcome::Node(rebuilt) => {
                let size = self.size - child.size + rebuilt.size;
                let even = Arc::new(NybbleNode {
                    dir: even.dir.replaced(child_at, rebuilt),
                });
                Outcome::Node(Arc::new(ByteNode {
                    prefix: self.prefix.clone(),
                    value: self.value.clone(),
                    size,
                    dir: self.dir.replaced(even_at, even),
                }))
            }
            Outcome::Removed => {
                debug_assert_eq!(child.size, 1);
                let dir = if even.dir.len() > 1 {
                    let shrunk = Arc::new(NybbleNode {
                        dir: even.dir.removed(child_at),
                    });
                    self.dir.replaced(even_at, shrunk)
                } else {
                    self.dir.removed(even_at)
                };
                let node = ByteNode {
                    prefix: self.prefix.clone(),
                    value: self.value.clone(),
                    size: self.size - 1,
                    dir,
                };
                if node.value.is_none() {
                    if node.dir.is_empty() {
                        return Outcome::Removed;
                    }
                    if let Some((byte, tail)) = node.sole_grandchild() {
                        return Outcome::Node(Arc::new(node.fused(byte, tail)));
                    }
                }
                Outcome::Node(Arc::new(node))
            }
        }
    }

    /// Path compression: concatenates this node's prefix, the dispatch byte,
    /// and the grandchild's prefix into one node. Any value on `self` is
    /// discarded; callers only fuse when the slot is (or just became) empty.
    fn fused(&self, byte: u8, tail: &ByteNode<V>) -> ByteNode<V> {
        let mut prefix = Vec::with_capacity(self.prefix.len() + 1 + tail.prefix.len());
        prefix.extend_from_slice(&self.prefix);
        prefix.push(byte);
        prefix.extend_from_slice(&tail.prefix);
        ByteNode {
            prefix: prefix.into_boxed_slice(),
            value: tail.value.clone(),
            size: tail.size,
            dir: tail.dir.clone(),
        }
    }

    /// Drops the stored value, fusing with a lone grandchild if that leaves
    /// this node as a valueless pass-through.
    fn without_value(&self) -> Arc<ByteNode<V>> {
        debug_assert!(self.value.is_some() && !self.dir.is_empty());
        if let Some((byte, tail)) = self.sole_grandchild() {
            return Arc::new(self.fused(byte, tail));
        }
        Arc::new(ByteNode {
            prefix: self.prefix.clone(),
            value: None,
            size: self.size - 1,
            dir: self.dir.clone(),
        })
    }

    /// Introduces an intermediate node where `rest` and the prefix first
    /// disagree, with the shrunk former self and a fresh leaf as the two
    /// branches.
    fn split_diverging(&self, rest: &[u8], at: usize, value: V) -> Arc<ByteNode<V>> {
        let ours = self.prefix[at];
        let theirs = rest[at];
        debug_assert_ne!(ours, theirs);

        let shrunk = Arc::new(ByteNode {
            prefix: self.prefix[at + 1..].into(),
            value: self.value.clone(),
            size: self.size,
            dir: self.dir.clone(),
        });
        let leaf = Arc::new(ByteNode::leaf(&rest[at + 1..], value));

        let dir = if high(ours) == high(theirs) {
            let even = Arc::new(NybbleNode::pair(low(ours), shrunk, low(theirs), leaf));
            Directory::single(high(ours), even)
        } else {
            Directory::pair(
                high(ours),
                Arc::new(NybbleNode::single(low(ours), shrunk)),
                high(theirs),
                Arc::new(NybbleNode::single(low(theirs), leaf)),
            )
        };

        Arc::new(ByteNode {
            prefix: self.prefix[..at].into(),
            value: None,
            size: self.size + 1,
            dir,
        })
    }

    /// Introduces an intermediate node when the key ends inside the prefix;
    /// the new node itself stores the value and keeps the shrunk former self
    /// as its only branch.
    fn split_shortened(&self, rest: &[u8], value: V) -> Arc<ByteNode<V>> {
        let byte = self.prefix[rest.len()];
        let shrunk = Arc::new(ByteNode {
            prefix: self.prefix[rest.len() + 1..].into(),
            value: self.value.clone(),
            size: self.size,
            dir: self.dir.clone(),
        });
        let even = Arc::new(NybbleNode::single(low(byte), shrunk));
        Arc::new(ByteNode {
            prefix: rest.into(),
            value: Some(value),
            size: self.size + 1,
            dir: Directory::single(high(byte), even),
        })
    }
}
