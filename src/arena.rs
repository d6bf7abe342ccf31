//! Slot arena holding the tree's nodes.
//!
//! Nodes refer to each other through [`NodeId`] handles instead of pointers, so
//! a rotation only rewrites a handful of integers and the parent back-link never
//! acts as a second owner. Freed slots go on a free list and are handed out
//! again by the next allocation.

use std::mem;
use std::ops::{Index, IndexMut};

// =============================================================================
// Handles and nodes
// =============================================================================

/// Handle of a node slot inside a [`NodeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn from_index(idx: usize) -> Self {
        Self(u32::try_from(idx).expect("node arena exceeds u32::MAX slots"))
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One stored entry and its position in the tree.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Option<NodeId>,
    pub(crate) less: Option<NodeId>,
    pub(crate) greater: Option<NodeId>,
    /// AA-tree level; 1 for a leaf.
    pub(crate) level: u32,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn leaf(key: K, value: V, parent: Option<NodeId>) -> Self {
        Self {
            key,
            value,
            parent,
            less: None,
            greater: None,
            level: 1,
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Clone)]
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    /// Vacant slots, reused LIFO.
    free: Vec<NodeId>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    /// Vacates the slot and hands back the node it held.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.slots[id.index()]
            .take()
            .expect("freeing a vacant node slot");
        self.free.push(id);
        node
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Bytes reserved by the slot and free-list buffers.
    pub(crate) fn capacity_bytes(&self) -> usize {
        self.slots.capacity() * mem::size_of::<Option<Node<K, V>>>()
            + self.free.capacity() * mem::size_of::<NodeId>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing vacant slots can go; interior ones are still addressed by index.
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Exchanges the key/value payloads of two nodes, leaving their links alone.
    pub(crate) fn swap_entries(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (lo, hi) = if a.index() < b.index() {
            (a.index(), b.index())
        } else {
            (b.index(), a.index())
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let x = head[lo].as_mut().expect("swap with a vacant node slot");
        let y = tail[0].as_mut().expect("swap with a vacant node slot");
        mem::swap(&mut x.key, &mut y.key);
        mem::swap(&mut x.value, &mut y.value);
    }

    /// Moves the nodes listed in `order` into a fresh, dense slot vector (in that
    /// order) and drops every other slot. Links are translated to the new handles.
    /// Returns the new handle of `root`.
    pub(crate) fn rebuild(&mut self, order: &[NodeId], root: NodeId) -> NodeId {
        let mut remap: Vec<Option<NodeId>> = vec![None; self.slots.len()];
        for (new_idx, old) in order.iter().enumerate() {
            remap[old.index()] = Some(NodeId::from_index(new_idx));
        }
        let translate = |link: Option<NodeId>| {
            link.map(|old| remap[old.index()].expect("link escapes the rebuilt node set"))
        };

        let mut slots = Vec::with_capacity(order.len());
        for old in order {
            let mut node = self.slots[old.index()]
                .take()
                .expect("rebuilding from a vacant node slot");
            node.parent = translate(node.parent);
            node.less = translate(node.less);
            node.greater = translate(node.greater);
            slots.push(Some(node));
        }

        self.slots = slots;
        self.free = Vec::new();
        remap[root.index()].expect("root missing from the rebuilt node set")
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn level(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self[id].level)
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(less) = self[id].less {
            id = less;
        }
        id
    }

    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(greater) = self[id].greater {
            id = greater;
        }
        id
    }

    /// In-order successor through child and parent links.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(greater) = self[id].greater {
            return Some(self.leftmost(greater));
        }
        // Climb until we arrive at an ancestor from its less side.
        let mut child = id;
        let mut parent = self[id].parent;
        while let Some(p) = parent {
            if self[p].less == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self[p].parent;
        }
        None
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K, V> {
        self.slots[id.index()]
            .as_ref()
            .expect("dangling node handle")
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.slots[id.index()]
            .as_mut()
            .expect("dangling node handle")
    }
}
