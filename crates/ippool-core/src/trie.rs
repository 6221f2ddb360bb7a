//! Binary trie storage for the allocator
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`]. Each node owns at
//! most two children, indexed directly by the branch bit, and keeps the index of its
//! parent so a block's address can be rebuilt by walking upwards.

use crate::errors::{IpPoolError, Result};
use std::fmt;

/// Index of a node in the trie arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root is always the first node in the arena
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }

    /// Id for the node stored at arena position `index`
    fn at(index: usize) -> Result<Self> {
        u32::try_from(index).map(NodeId).map_err(|_| {
            IpPoolError::invariant(format!("trie arena index {index} does not fit a node id"))
        })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

/// One contiguous block at a specific mask size.
///
/// A node is reserved exactly when it carries an owner key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieNode {
    /// Branch bit taken from the parent (0 for the root)
    pub bit: u8,
    /// Address bits still free below this node
    pub mask_size: u8,
    /// Key of the reservation held by this node
    pub owner_key: Option<String>,
    /// Parent node; `None` only for the root
    pub parent: Option<NodeId>,
    /// Children indexed by branch bit
    pub children: [Option<NodeId>; 2],
}

impl TrieNode {
    fn new(bit: u8, mask_size: u8, parent: Option<NodeId>) -> Self {
        Self {
            bit,
            mask_size,
            owner_key: None,
            parent,
            children: [None, None],
        }
    }

    /// Whether this block is reserved
    pub fn is_reserved(&self) -> bool {
        self.owner_key.is_some()
    }

    /// Children in branch order, bit 0 first
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }
}

/// Arena holding every node of one allocator's trie
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Trie {
    /// Trie with a single unreserved root having `mask_size` free bits
    pub fn new(mask_size: u8) -> Self {
        Self {
            nodes: vec![TrieNode::new(0, mask_size, None)],
        }
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.nodes[id.index()]
    }

    /// Number of materialized nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists for the trie's whole lifetime
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Existing child on `bit`, or a freshly created unreserved one.
    ///
    /// Callers must not descend below a node with `mask_size == 0`.
    pub fn child_or_insert(&mut self, parent: NodeId, bit: u8) -> Result<NodeId> {
        let slot = usize::from(bit & 1);
        if let Some(existing) = self.node(parent).children[slot] {
            return Ok(existing);
        }
        let mask_size = self.node(parent).mask_size - 1;
        let id = NodeId::at(self.nodes.len())?;
        self.nodes.push(TrieNode::new(bit & 1, mask_size, Some(parent)));
        self.node_mut(parent).children[slot] = Some(id);
        Ok(id)
    }

    /// Mark `id` reserved for `key`
    pub fn reserve(&mut self, id: NodeId, key: String) {
        self.node_mut(id).owner_key = Some(key);
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> u8 {
        self.node(NodeId::ROOT).mask_size - self.node(id).mask_size
    }

    /// Branch bits from the root down to `id`, packed most significant first.
    pub fn path_bits(&self, id: NodeId) -> u32 {
        let mut bits = Vec::with_capacity(32);
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            bits.push(self.node(current).bit);
            current = parent;
        }
        bits.iter()
            .rev()
            .fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit))
    }

    /// First reserved node in `id`'s subtree (including `id`), depth-first, bit 0 first
    pub fn first_reserved_in_subtree(&self, id: NodeId) -> Option<NodeId> {
        if self.node(id).is_reserved() {
            return Some(id);
        }
        self.node(id)
            .child_ids()
            .find_map(|child| self.first_reserved_in_subtree(child))
    }

    /// Every reserved node, depth-first, bit 0 before bit 1
    pub fn reserved_nodes(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_reserved(NodeId::ROOT, &mut found);
        found
    }

    fn collect_reserved(&self, id: NodeId, found: &mut Vec<NodeId>) {
        if self.node(id).is_reserved() {
            found.push(id);
        }
        for child in self.node(id).child_ids() {
            self.collect_reserved(child, found);
        }
    }

    /// Arena length, used as a rollback mark
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node created after `mark` and unlink it from its parent.
    ///
    /// Returns how many nodes were removed.
    pub fn rollback(&mut self, mark: usize) -> usize {
        if mark >= self.nodes.len() {
            return 0;
        }
        let removed = self.nodes.len() - mark;
        self.nodes.truncate(mark);
        for node in &mut self.nodes {
            for slot in &mut node.children {
                if slot.is_some_and(|child| child.index() >= mark) {
                    *slot = None;
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_or_insert_is_idempotent() {
        let mut trie = Trie::new(8);
        let zero = trie.child_or_insert(NodeId::ROOT, 0).unwrap();
        let again = trie.child_or_insert(NodeId::ROOT, 0).unwrap();
        assert_eq!(zero, again);
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.node(zero).mask_size, 7);
        assert_eq!(trie.node(zero).parent, Some(NodeId::ROOT));
    }

    #[test]
    fn test_path_bits_and_depth() {
        let mut trie = Trie::new(4);
        let one = trie.child_or_insert(NodeId::ROOT, 1).unwrap();
        let one_zero = trie.child_or_insert(one, 0).unwrap();
        let one_zero_one = trie.child_or_insert(one_zero, 1).unwrap();
        assert_eq!(trie.depth(one_zero_one), 3);
        assert_eq!(trie.path_bits(one_zero_one), 0b101);
        assert_eq!(trie.path_bits(NodeId::ROOT), 0);
    }

    #[test]
    fn test_reserved_traversal_order() {
        let mut trie = Trie::new(2);
        let one = trie.child_or_insert(NodeId::ROOT, 1).unwrap();
        let zero = trie.child_or_insert(NodeId::ROOT, 0).unwrap();
        trie.reserve(one, "b".to_string());
        trie.reserve(zero, "a".to_string());
        assert_eq!(trie.reserved_nodes(), vec![zero, one]);
        assert_eq!(trie.first_reserved_in_subtree(NodeId::ROOT), Some(zero));
    }

    #[test]
    fn test_rollback_unlinks_new_nodes() {
        let mut trie = Trie::new(3);
        let zero = trie.child_or_insert(NodeId::ROOT, 0).unwrap();
        let mark = trie.mark();
        let deeper = trie.child_or_insert(zero, 1).unwrap();
        trie.child_or_insert(deeper, 0).unwrap();
        trie.child_or_insert(NodeId::ROOT, 1).unwrap();

        assert_eq!(trie.rollback(mark), 3);
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.node(zero).children, [None, None]);
        assert_eq!(trie.node(NodeId::ROOT).children, [Some(zero), None]);
        assert_eq!(trie.rollback(mark), 0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_node_id_beyond_u32_is_invariant_violation() {
        assert_eq!(NodeId::at(7).unwrap(), NodeId(7));
        assert_eq!(NodeId::at(u32::MAX as usize).unwrap(), NodeId(u32::MAX));

        let err = NodeId::at(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, IpPoolError::Invariant { .. }));
        assert!(!err.is_business());
    }
}
