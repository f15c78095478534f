//! Ordered traversals.
//!
//! All ordered iterators run on one stack machine. A step on the stack is
//! either a subtree scheduled for expansion, a path-buffer edit, or a value
//! ready to be emitted. Expanding a subtree pushes the steps for its value
//! and children in the reverse of the order they should be observed, so the
//! machine visits entries lazily with O(depth · 16) live steps and can be
//! abandoned at any point without cleanup.
//!
//! The path buffer holds the key bytes accumulated on the way down: each
//! expansion appends the node's prefix (and the dispatch byte that led to
//! it), and a rewind step restores the buffer when the subtree is left.
//! Emitting an entry snapshots the buffer into a fresh key allocation.
//!
//! The bounded traversals (`≤ key`, `≥ key`, starts-with) follow the bound
//! byte-for-byte while it constrains the walk. At most one bounded step is
//! live at a time; every subtree strictly inside the bound degenerates to a
//! plain ascending or descending expansion.

use super::bytenode::{common_prefix_len, high, join, low, ByteNode};

/// Lazy ordered iterator over trie entries.
///
/// Yields `(key, value)` pairs with a freshly allocated key per entry.
/// Single-pass and not restartable, but valid for as long as the snapshot
/// it was created from is held.
pub struct Iter<'a, V> {
    stack: Vec<Step<'a, V>>,
    path: Vec<u8>,
    bound: Box<[u8]>,
}

enum Step<'a, V> {
    /// Whole subtree in ascending order.
    Asc(&'a ByteNode<V>),
    /// Whole subtree in descending order.
    Desc(&'a ByteNode<V>),
    /// Entries ≥ the bound suffix starting at the given key offset, ascending.
    AscFrom(&'a ByteNode<V>, usize),
    /// Entries ≤ the bound suffix starting at the given key offset, descending.
    DescTo(&'a ByteNode<V>, usize),
    /// Descend along the bound; the subtree where it is exhausted is ascending.
    Prefixed(&'a ByteNode<V>, usize),
    /// Append one dispatch byte to the path.
    Byte(u8),
    /// Truncate the path back to a descent mark.
    Rewind(usize),
    /// Yield the value under the current path.
    Emit(&'a V),
}

impl<'a, V> Iter<'a, V> {
    fn seeded(root: Option<&'a ByteNode<V>>, bound: &[u8], step: fn(&'a ByteNode<V>) -> Step<'a, V>) -> Self {
        Iter {
            stack: root.map(step).into_iter().collect(),
            path: Vec::new(),
            bound: bound.into(),
        }
    }

    pub(crate) fn ascending(root: Option<&'a ByteNode<V>>) -> Self {
        Self::seeded(root, &[], Step::Asc)
    }

    pub(crate) fn descending(root: Option<&'a ByteNode<V>>) -> Self {
        Self::seeded(root, &[], Step::Desc)
    }

    pub(crate) fn greater_or_equal(root: Option<&'a ByteNode<V>>, key: &[u8]) -> Self {
        Self::seeded(root, key, |node| Step::AscFrom(node, 0))
    }

    pub(crate) fn less_or_equal(root: Option<&'a ByteNode<V>>, key: &[u8]) -> Self {
        Self::seeded(root, key, |node| Step::DescTo(node, 0))
    }

    pub(crate) fn prefixed(root: Option<&'a ByteNode<V>>, prefix: &[u8]) -> Self {
        Self::seeded(root, prefix, |node| Step::Prefixed(node, 0))
    }

    /// Appends the node prefix to the path and schedules the rewind that
    /// undoes it; returns the path length with the prefix applied.
    fn descend(&mut self, node: &'a ByteNode<V>) -> usize {
        let mark = self.path.len();
        self.path.extend_from_slice(&node.prefix);
        self.stack.push(Step::Rewind(mark));
        self.path.len()
    }

    fn expand_asc(&mut self, node: &'a ByteNode<V>) {
        let base = self.descend(node);
        for (hi, even) in node.dir.iter().rev() {
            for (lo, child) in even.dir.iter().rev() {
                self.stack.push(Step::Rewind(base));
                self.stack.push(Step::Asc(child));
                self.stack.push(Step::Byte(join(hi, lo)));
            }
        }
        if let Some(value) = &node.value {
            self.stack.push(Step::Emit(value));
        }
    }

    fn expand_desc(&mut self, node: &'a ByteNode<V>) {
        let base = self.descend(node);
        if let Some(value) = &node.value {
            self.stack.push(Step::Emit(value));
        }
        for (hi, even) in node.dir.iter() {
            for (lo, child) in even.dir.iter() {
                self.stack.push(Step::Rewind(base));
                self.stack.push(Step::Desc(child));
                self.stack.push(Step::Byte(join(hi, lo)));
            }
        }
    }

    fn expand_asc_from(&mut self, node: &'a ByteNode<V>, at: usize) {
        let rest = &self.bound[at..];
        let overlap = common_prefix_len(&node.prefix, rest);
        if overlap < node.prefix.len() && overlap < rest.len() {
            if node.prefix[overlap] > rest[overlap] {
                // Every key below starts above the bound.
                self.stack.push(Step::Asc(node));
            }
            return;
        }
        if overlap == rest.len() {
            // The bound ends at or inside this prefix, so the whole subtree
            // (its own value included) sorts at or above it.
            self.stack.push(Step::Asc(node));
            return;
        }

        // The bound continues below; this node's own key is a proper prefix
        // of it and stays excluded.
        let split = rest[node.prefix.len()];
        let (h, l) = (high(split), low(split));
        let below = at + node.prefix.len() + 1;
        let base = self.descend(node);

        // Push from the highest entry down so the smallest pops first; the
        // child on the bound path recurses, everything above it is free.
        for (hi, even) in node.dir.iter().rev() {
            if hi < h {
                break;
            }
            for (lo, child) in even.dir.iter().rev() {
                if hi == h && lo < l {
                    break;
                }
                self.stack.push(Step::Rewind(base));
                if hi == h && lo == l {
                    self.stack.push(Step::AscFrom(child, below));
                } else {
                    self.stack.push(Step::Asc(child));
                }
                self.stack.push(Step::Byte(join(hi, lo)));
            }
        }
    }

    fn expand_desc_to(&mut self, node: &'a ByteNode<V>, at: usize) {
        let rest = &self.bound[at..];
        let overlap = common_prefix_len(&node.prefix, rest);
        if overlap < node.prefix.len() && overlap < rest.len() {
            if node.prefix[overlap] < rest[overlap] {
                // Every key below stays under the bound.
                self.stack.push(Step::Desc(node));
            }
            return;
        }
        if overlap == rest.len() {
            if rest.len() == node.prefix.len() {
                // This node's key equals the bound; every child extends past
                // it, so only the value here qualifies.
                self.descend(node);
                if let Some(value) = &node.value {
                    self.stack.push(Step::Emit(value));
                }
            }
            // Bound ends strictly inside the prefix: the whole subtree sorts
            // above it.
            return;
        }

        // The bound continues below; this node's own key is a proper prefix
        // of it and is the smallest qualifying entry, emitted last.
        let split = rest[node.prefix.len()];
        let (h, l) = (high(split), low(split));
        let below = at + node.prefix.len() + 1;
        let base = self.descend(node);
        if let Some(value) = &node.value {
            self.stack.push(Step::Emit(value));
        }

        // Push from the lowest entry up so the bound-path child pops first,
        // then strictly smaller dispatch bytes in descending order.
        for (hi, even) in node.dir.iter() {
            if hi > h {
                break;
            }
            for (lo, child) in even.dir.iter() {
                if hi == h && lo > l {
                    break;
                }
                self.stack.push(Step::Rewind(base));
                if hi == h && lo == l {
                    self.stack.push(Step::DescTo(child, below));
                } else {
                    self.stack.push(Step::Desc(child));
                }
                self.stack.push(Step::Byte(join(hi, lo)));
            }
        }
    }

    fn expand_prefixed(&mut self, node: &'a ByteNode<V>, at: usize) {
        let rest = &self.bound[at..];
        let overlap = common_prefix_len(&node.prefix, rest);
        if overlap == rest.len() {
            // Sought prefix exhausted: everything below matches.
            self.stack.push(Step::Asc(node));
            return;
        }
        if overlap < node.prefix.len() {
            return;
        }
        let byte = rest[node.prefix.len()];
        let child = node
            .dir
            .get(high(byte))
            .and_then(|even| even.get(low(byte)));
        if let Some(child) = child {
            let mark = self.path.len();
            self.path.extend_from_slice(&node.prefix);
            self.path.push(byte);
            self.stack.push(Step::Rewind(mark));
            self.stack
                .push(Step::Prefixed(child, at + node.prefix.len() + 1));
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Step::Emit(value) => return Some((self.path.clone(), value)),
                Step::Byte(byte) => self.path.push(byte),
                Step::Rewind(mark) => self.path.truncate(mark),
                Step::Asc(node) => self.expand_asc(node),
                Step::Desc(node) => self.expand_desc(node),
                Step::AscFrom(node, at) => self.expand_asc_from(node, at),
                Step::DescTo(node, at) => self.expand_desc_to(node, at),
                Step::Prefixed(node, at) => self.expand_prefixed(node, at),
            }
        }
    }
}

impl<V> std::iter::FusedIterator for Iter<'_, V> {}
