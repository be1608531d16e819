use super::node::Node;
use crate::types::{Family, PrefixId};

/// A binary prefix trie holding IPv4 and IPv6 prefixes side by side (§4.A).
/// The two families share nothing and never match each other; they simply
/// live in two separate trees under one roof.
pub struct RadixTree<T> {
    v4: Option<Box<Node<T>>>,
    v6: Option<Box<Node<T>>>,
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        RadixTree { v4: None, v6: None }
    }
}

impl<T: Default> RadixTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn root(&self, family: Family) -> &Option<Box<Node<T>>> {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    fn root_mut(&mut self, family: Family) -> &mut Option<Box<Node<T>>> {
        match family {
            Family::V4 => &mut self.v4,
            Family::V6 => &mut self.v6,
        }
    }

    /// Discards everything in both trees (used on NRTM serial overrun).
    pub fn clear(&mut self) {
        self.v4 = None;
        self.v6 = None;
    }

    /// Idempotent on structure: returns the data for `prefix`, creating
    /// every node on the path (with empty data) as needed.
    pub fn add(&mut self, prefix: PrefixId) -> &mut T {
        let mut slot = self.root_mut(prefix.family());
        for depth in 0..prefix.len() {
            if slot.is_none() {
                *slot = Some(Box::new(Node::new(prefix.truncated(depth))));
            }
            let bit = prefix.bit(depth);
            let node = slot.as_mut().unwrap();
            slot = if bit { &mut node.right } else { &mut node.left };
        }
        if slot.is_none() {
            *slot = Some(Box::new(Node::new(prefix)));
        }
        slot.as_mut().unwrap().data.get_or_insert_with(T::default)
    }

    /// Removes the node matching `prefix` exactly. Returns `false` (a soft
    /// error per §3 invariant 4) if it wasn't present.
    pub fn delete(&mut self, prefix: &PrefixId) -> bool {
        let mut slot = self.root_mut(prefix.family());
        for depth in 0..prefix.len() {
            match slot.as_mut() {
                Some(node) => {
                    let bit = prefix.bit(depth);
                    slot = if bit { &mut node.right } else { &mut node.left };
                }
                None => return false,
            }
        }
        match slot.as_mut() {
            Some(node) if node.data.is_some() => {
                node.data = None;
                true
            }
            _ => false,
        }
    }

    /// Exact-length match only.
    pub fn search_exact(&self, prefix: &PrefixId) -> Option<&T> {
        let mut node = self.root(prefix.family()).as_deref();
        for depth in 0..prefix.len() {
            let n = node?;
            let bit = prefix.bit(depth);
            node = if bit { n.right.as_deref() } else { n.left.as_deref() };
        }
        node.and_then(|n| n.data.as_ref())
    }

    /// The least-specific ancestor of `prefix` that was ever `add`-ed (the
    /// covering aggregate), or `None` if nothing on the path has data.
    pub fn search_worst(&self, prefix: &PrefixId) -> Option<(PrefixId, &T)> {
        let mut node = self.root(prefix.family()).as_deref();
        let mut depth = 0u8;
        loop {
            let n = node?;
            if let Some(data) = &n.data {
                return Some((n.prefix, data));
            }
            if depth == prefix.len() {
                return None;
            }
            let bit = prefix.bit(depth);
            node = if bit { n.right.as_deref() } else { n.left.as_deref() };
            depth += 1;
        }
    }

    /// Every node whose prefix is contained within `prefix` (inclusive of
    /// `prefix` itself). Order is unspecified.
    pub fn search_covered(&self, prefix: &PrefixId) -> Vec<(PrefixId, &T)> {
        let mut node = self.root(prefix.family()).as_deref();
        for depth in 0..prefix.len() {
            let Some(n) = node else {
                return Vec::new();
            };
            let bit = prefix.bit(depth);
            node = if bit { n.right.as_deref() } else { n.left.as_deref() };
        }
        let mut out = Vec::new();
        if let Some(n) = node {
            collect_subtree(n, &mut out);
        }
        out
    }
}

fn collect_subtree<'a, T>(node: &'a Node<T>, out: &mut Vec<(PrefixId, &'a T)>) {
    if let Some(data) = &node.data {
        out.push((node.prefix, data));
    }
    if let Some(left) = &node.left {
        collect_subtree(left, out);
    }
    if let Some(right) = &node.right {
        collect_subtree(right, out);
    }
}
