//! # Persistent nybble-partitioned radix trie
//!
//! A persistent (immutable, structurally shared) map from arbitrary byte
//! strings to values of an opaque type, stored as a path-compressed radix
//! trie that dispatches on 4-bit nybbles rather than whole bytes.
//!
//! Splitting each key byte into its high and low nybble caps the fan-out of
//! any node at 16, which lets a node directory be a small sorted byte array
//! instead of a 256-slot table. The trie therefore alternates between two
//! node shapes: `ByteNode`s sit at byte boundaries and carry a compressed
//! prefix, an optional value, and a directory over high nybbles, while
//! `NybbleNode`s complete the half-consumed byte with a directory over low
//! nybbles. Since both directories are kept sorted, every traversal of the
//! tree in directory order visits keys in unsigned lexicographic order for
//! free.
//!
//! All nodes are immutable after construction and shared between container
//! snapshots via `Arc`. An update walks the spine from the root to the
//! affected node and rebuilds exactly the nodes on that spine; everything
//! off the spine is carried over by reference. Cloning a [`QpTrie`] is O(1),
//! readers never take a lock, and a snapshot stays valid for as long as the
//! handle is held, no matter how many updates are derived from it.
//!
//! ```
//! use qptrie::QpTrie;
//!
//! let trie: QpTrie<u32> = QpTrie::new();
//! let trie = trie.insert(b"roma", 1).insert(b"romane", 2).insert(b"rubens", 3);
//!
//! assert_eq!(trie.get(b"romane"), Some(&2));
//! assert_eq!(trie.len(), 3);
//!
//! let keys: Vec<_> = trie.iter_ascending().map(|(k, _)| k).collect();
//! assert_eq!(keys, vec![b"roma".to_vec(), b"romane".to_vec(), b"rubens".to_vec()]);
//!
//! // Updates return a new snapshot; the old one is untouched.
//! let pruned = trie.remove(b"roma");
//! assert_eq!(pruned.len(), 2);
//! assert_eq!(trie.len(), 3);
//! ```

pub mod trie;

pub use trie::iter::Iter;
pub use trie::prefixes::PrefixesOf;
pub use trie::{Edit, QpTrie};
