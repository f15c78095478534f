//! # Persistent nybble-partitioned radix trie
//!
//! The trie maps arbitrary byte strings to values and keeps every snapshot
//! alive forever: updates rebuild only the root-to-leaf spine they touch and
//! share everything else with the snapshot they started from.
//!
//! Keys descend the tree half a byte at a time. A node at a byte boundary
//! (`ByteNode`) first consumes a compressed multi-byte prefix, then splits
//! the next key byte into its high nybble, resolved in the node's own sorted
//! directory, and its low nybble, resolved in the selected `NybbleNode`.
//! Keeping both directories sorted makes lexicographic traversal the natural
//! traversal, and capping them at 16 entries keeps every rebuild a short
//! array copy.
//!
//! Path compression keeps the tree dense: a node without a value and with
//! only one reachable grandchild is fused into it, so the depth of the tree
//! is bounded by the stored key material, not by the key length alone.

pub(crate) mod bytenode;
pub(crate) mod directory;
pub mod iter;
pub(crate) mod nybblenode;
pub mod prefixes;

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use self::bytenode::{ByteNode, Outcome};
use self::iter::Iter;
use self::prefixes::PrefixesOf;

/// Instruction returned by an [`QpTrie::update`] transformer.
#[derive(Debug)]
pub enum Edit<V> {
    /// Leave the entry exactly as it is. The update returns the original
    /// container, pointer-identical, without allocating.
    Keep,
    /// Store this value at the key, replacing any incumbent.
    Put(V),
    /// Remove the entry if present; a no-op otherwise.
    Remove,
}

/// A persistent map from byte strings to `V`.
///
/// The handle is a single root pointer plus nothing else: cloning is O(1)
/// and never blocks, and a clone is a true snapshot that no later update can
/// disturb. All reading operations take `&self`; all writing operations take
/// `&self` and return the updated container as a new value.
///
/// Keys are compared as raw bytes in unsigned lexicographic order. The empty
/// key is an ordinary key.
pub struct QpTrie<V> {
    root: Option<Arc<ByteNode<V>>>,
}

impl<V> QpTrie<V> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        QpTrie { root: None }
    }

    /// Number of entries. O(1), served from the root's subtree counter.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.size)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Looks up the value stored at exactly `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.root.as_ref()?.get(key, 0)
    }

    /// Whether any stored key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        match &self.root {
            Some(root) => root.count_prefixed(prefix, 0) != 0,
            None => prefix.is_empty(),
        }
    }

    /// Number of entries whose key starts with `prefix`, answered from the
    /// subtree counters in O(|prefix|) without walking the entries.
    pub fn count_prefixed(&self, prefix: &[u8]) -> usize {
        match &self.root {
            Some(root) => root.count_prefixed(prefix, 0),
            None => 0,
        }
    }

    /// All entries in ascending key order.
    pub fn iter_ascending(&self) -> Iter<'_, V> {
        Iter::ascending(self.root.as_deref())
    }

    /// All entries in descending key order.
    pub fn iter_descending(&self) -> Iter<'_, V> {
        Iter::descending(self.root.as_deref())
    }

    /// Entries with key ≤ `key`, in descending key order (the largest
    /// qualifying key first).
    pub fn iter_less_or_equal(&self, key: &[u8]) -> Iter<'_, V> {
        Iter::less_or_equal(self.root.as_deref(), key)
    }

    /// Entries with key ≥ `key`, in ascending key order.
    pub fn iter_greater_or_equal(&self, key: &[u8]) -> Iter<'_, V> {
        Iter::greater_or_equal(self.root.as_deref(), key)
    }

    /// Entries whose key starts with `prefix`, in ascending key order.
    pub fn iter_prefixed(&self, prefix: &[u8]) -> Iter<'_, V> {
        Iter::prefixed(self.root.as_deref(), prefix)
    }

    /// Stored keys that are (non-strict) prefixes of `key`, shortest first.
    pub fn iter_prefixes_of(&self, key: &[u8]) -> PrefixesOf<'_, V> {
        PrefixesOf::new(self.root.as_ref(), key)
    }

    /// Runs the structural self-check over the whole tree.
    ///
    /// Verifies directory ordering, size accounting, and the
    /// path-compression rule on every reachable node. Panics on the first
    /// violation; meant for tests and debugging, not for steady-state use.
    pub fn debug_check_invariants(&self) {
        if let Some(root) = &self.root {
            root.check_invariants();
        }
    }

    /// Whether two handles are the same snapshot (identical root pointer).
    ///
    /// This is identity, not equality: two tries built separately from the
    /// same entries compare equal but do not share a root.
    pub fn shares_root_with(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<V: Clone> QpTrie<V> {
    /// Applies `edit` to the entry at `key` and returns the resulting
    /// container.
    ///
    /// The transformer is evaluated exactly once, against the incumbent
    /// value if the key is present. When it returns [`Edit::Keep`], or
    /// removes an entry that does not exist, the result is the original
    /// container itself: its root pointer is the same allocation and no node
    /// is copied, so callers can detect "nothing changed" with
    /// [`QpTrie::shares_root_with`].
    pub fn update<F>(&self, key: &[u8], edit: F) -> Self
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        match &self.root {
            None => match edit(None) {
                Edit::Put(value) => QpTrie {
                    root: Some(Arc::new(ByteNode::leaf(key, value))),
                },
                Edit::Keep | Edit::Remove => self.clone(),
            },
            Some(root) => match root.update(key, 0, edit) {
                Outcome::Same => self.clone(),
                Outcome::Node(root) => QpTrie { root: Some(root) },
                Outcome::Removed => QpTrie { root: None },
            },
        }
    }

    /// Stores `value` at `key`, replacing any incumbent.
    pub fn insert(&self, key: &[u8], value: V) -> Self {
        self.update(key, |_| Edit::Put(value))
    }

    /// Removes the entry at `key` if there is one.
    pub fn remove(&self, key: &[u8]) -> Self {
        self.update(key, |_| Edit::Remove)
    }
}

impl<V> Clone for QpTrie<V> {
    fn clone(&self) -> Self {
        QpTrie {
            root: self.root.clone(),
        }
    }
}

impl<V> Default for QpTrie<V> {
    fn default() -> Self {
        QpTrie::new()
    }
}

impl<V: Debug> Debug for QpTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter_ascending()).finish()
    }
}

impl<V: PartialEq> PartialEq for QpTrie<V> {
    fn eq(&self, other: &Self) -> bool {
        if self.shares_root_with(other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        self.iter_ascending()
            .zip(other.iter_ascending())
            .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl<V: Eq> Eq for QpTrie<V> {}

impl<'a, V> IntoIterator for &'a QpTrie<V> {
    type Item = (Vec<u8>, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_ascending()
    }
}

impl<K: AsRef<[u8]>, V: Clone> FromIterator<(K, V)> for QpTrie<V> {
    /// Folds the entries into an empty trie; a later entry with a key seen
    /// before overwrites the earlier value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let mut trie = QpTrie::new();
        trie.extend(entries);
        trie
    }
}

impl<K: AsRef<[u8]>, V: Clone> Extend<(K, V)> for QpTrie<V> {
    /// Rebinds the handle to the container holding the additional entries.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        for (key, value) in entries {
            *self = self.insert(key.as_ref(), value);
        }
    }
}

#[cfg(feature = "arbitrary")]
impl<'a, V> arbitrary::Arbitrary<'a> for QpTrie<V>
where
    V: arbitrary::Arbitrary<'a> + Clone,
{
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let entries: Vec<(Vec<u8>, V)> = u.arbitrary()?;
        Ok(entries.into_iter().collect())
    }
}
