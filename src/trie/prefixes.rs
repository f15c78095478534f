//! The prefix-chain traversal.

use std::sync::Arc;

use super::bytenode::{high, low, ByteNode};

/// Iterator over every stored key that is a (non-strict) prefix of a query
/// key, shortest first.
///
/// Unlike the ordered traversals this walks a single root-to-leaf path: the
/// one spelled by the query key. It therefore yields at most
/// `1 + min(query length, tree depth)` entries and holds no expansion stack,
/// just the current node and how much of the query it has consumed. The
/// query is copied into the iterator, so it stays usable after the borrow
/// that produced it ends.
pub struct PrefixesOf<'a, V> {
    node: Option<&'a ByteNode<V>>,
    query: Box<[u8]>,
    at: usize,
    path: Vec<u8>,
}

impl<'a, V> PrefixesOf<'a, V> {
    pub(crate) fn new(root: Option<&'a Arc<ByteNode<V>>>, query: &[u8]) -> Self {
        PrefixesOf {
            node: root.map(|node| &**node),
            query: query.into(),
            at: 0,
            path: Vec::new(),
        }
    }
}

impl<'a, V> Iterator for PrefixesOf<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.node.take()?;
            let rest = &self.query[self.at..];

            // The node's whole prefix has to lie inside the query, or the
            // key at this node (and every key below it) stops being a
            // prefix of the query.
            if rest.len() < node.prefix.len() || rest[..node.prefix.len()] != *node.prefix {
                return None;
            }
            self.path.extend_from_slice(&node.prefix);
            let consumed = self.at + node.prefix.len();

            let item = node.value.as_ref().map(|value| (self.path.clone(), value));

            if consumed < self.query.len() {
                let byte = self.query[consumed];
                if let Some(child) = node
                    .dir
                    .get(high(byte))
                    .and_then(|even| even.get(low(byte)))
                {
                    self.node = Some(child);
                    self.path.push(byte);
                    self.at = consumed + 1;
                }
            }

            if item.is_some() {
                return item;
            }
        }
    }
}

impl<V> std::iter::FusedIterator for PrefixesOf<'_, V> {}
