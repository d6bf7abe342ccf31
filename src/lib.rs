//! # aa-tree
//!
//! An ordered map backed by an AA-tree: a balanced binary search tree that keeps
//! an integer *level* per node instead of a red/black color and restores balance
//! with two rotations, `skew` and `split`.
//!
//! Nodes live in an arena and point at each other through integer handles,
//! including a parent back-link that lets the iterator walk in key order
//! without an auxiliary stack.
//!
//! ## Example
//!
//! ```rust
//! use aa_tree::TreeMap;
//!
//! let mut map = TreeMap::new();
//! map.insert(5, "five");
//! map.insert(1, "one");
//! map.insert(3, "three");
//!
//! assert_eq!(map.get(&3), Some(&"three"));
//! assert_eq!(map.first(), Some((&1, &"one")));
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
//! ```
//!
//! A custom order is any `Fn(&K, &K) -> Ordering`:
//!
//! ```rust
//! use aa_tree::TreeMap;
//!
//! let mut map = TreeMap::with_cmp(|a: &i32, b: &i32| b.cmp(a));
//! map.extend([(1, 'a'), (2, 'b'), (3, 'c')]);
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
//! ```

#![forbid(unsafe_code)]

mod arena;
mod iter;

use std::cmp::Ordering;
use std::fmt;
use std::mem;

pub use compare::{Compare, Natural};

use arena::{Node, NodeArena, NodeId};
pub use iter::{IntoIter, Iter, Keys, Values};

#[derive(Clone, Copy)]
enum Side {
    Less,
    Greater,
}

/// What a removal walk is looking for.
enum Target<'q, K> {
    Key(&'q K),
    /// Leftmost node of the subtree.
    First,
    /// Rightmost node of the subtree.
    Last,
}

// =============================================================================
// TreeMap
// =============================================================================

/// An ordered map backed by an AA-tree.
///
/// Keys are ordered by the comparator `C`, which defaults to the keys' natural
/// [`Ord`] order. The comparator must be a total order consistent with key
/// identity; the map's behavior is unspecified otherwise.
///
/// The map is a plain single-writer structure. Share it across threads only
/// behind an external lock that also covers iteration.
pub struct TreeMap<K, V, C = Natural<K>> {
    nodes: NodeArena<K, V>,
    root: Option<NodeId>,
    count: usize,
    cmp: C,
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Creates an empty map ordered by `K`'s natural order.
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }

    /// Creates an empty map with room for `capacity` entries before the node
    /// arena reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_cmp(capacity, compare::natural())
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`.
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_capacity_and_cmp(0, cmp)
    }

    pub fn with_capacity_and_cmp(capacity: usize, cmp: C) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            root: None,
            count: 0,
            cmp,
        }
    }

    /// The comparator ordering this map.
    pub fn cmp(&self) -> &C {
        &self.cmp
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.count = 0;
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        let node = &self.nodes[self.nodes.leftmost(self.root?)];
        Some((&node.key, &node.value))
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        let node = &self.nodes[self.nodes.rightmost(self.root?)];
        Some((&node.key, &node.value))
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last().map(|(k, _)| k)
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.root, self.count)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Bytes reserved by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity_bytes()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Rebuilds the node arena so live nodes sit densely in key order.
    ///
    /// Removals leave vacant slots that later insertions reuse; after heavy
    /// churn this drops the holes and improves iteration locality. Returns the
    /// number of nodes moved.
    pub fn compact(&mut self) -> usize {
        let Some(root) = self.root else {
            self.nodes.clear();
            return 0;
        };

        let mut order = Vec::with_capacity(self.count);
        let mut current = Some(self.nodes.leftmost(root));
        while let Some(id) = current {
            order.push(id);
            current = self.nodes.successor(id);
        }
        debug_assert_eq!(order.len(), self.count);

        self.root = Some(self.nodes.rebuild(&order, root));
        order.len()
    }
}

impl<K, V, C: Compare<K>> TreeMap<K, V, C> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|id| &self.nodes[id].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(&mut self.nodes[id].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `value` under `key`.
    ///
    /// If the key is already present its value is replaced in place, without
    /// any restructuring, and the old value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(root) = self.root else {
            self.root = Some(self.nodes.alloc(Node::leaf(key, value, None)));
            self.count += 1;
            return None;
        };

        let (top, old) = self.insert_walk(root, key, value);
        self.root = Some(top);
        debug_assert!(self.nodes[top].parent.is_none());
        old
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.remove_target(Target::Key(key))
    }

    /// Removes and returns the entry with the smallest key.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.remove_target(Target::First)
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.remove_target(Target::Last)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Less => node.less,
                Ordering::Greater => node.greater,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Inserts below `id` and returns the node now at `id`'s position together
    /// with the replaced value, if any.
    fn insert_walk(&mut self, id: NodeId, key: K, value: V) -> (NodeId, Option<V>) {
        let (side, child) = match self.cmp.compare(&key, &self.nodes[id].key) {
            Ordering::Less => (Side::Less, self.nodes[id].less),
            Ordering::Greater => (Side::Greater, self.nodes[id].greater),
            Ordering::Equal => {
                let old = mem::replace(&mut self.nodes[id].value, value);
                return (id, Some(old));
            }
        };

        match child {
            Some(child) => {
                let (top, old) = self.insert_walk(child, key, value);
                if old.is_some() {
                    // Value-only update; the shape did not change.
                    return (id, old);
                }
                self.set_child(id, side, Some(top));
            }
            None => {
                let leaf = self.nodes.alloc(Node::leaf(key, value, Some(id)));
                self.set_child(id, side, Some(leaf));
                self.count += 1;
            }
        }

        let top = self.skew(id);
        (self.split(top), None)
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    fn remove_target(&mut self, target: Target<'_, K>) -> Option<(K, V)> {
        let root = self.root?;
        let (top, removed) = self.remove_walk(root, target);
        self.root = top;
        debug_assert!(top.map_or(true, |top| self.nodes[top].parent.is_none()));
        removed
    }

    fn direction(&self, id: NodeId, target: &Target<'_, K>) -> Ordering {
        let node = &self.nodes[id];
        match *target {
            Target::Key(key) => self.cmp.compare(key, &node.key),
            Target::First if node.less.is_some() => Ordering::Less,
            Target::Last if node.greater.is_some() => Ordering::Greater,
            Target::First | Target::Last => Ordering::Equal,
        }
    }

    /// Removes the target from the subtree rooted at `id`. Returns the node now
    /// at `id`'s position (`None` if the subtree became empty) and the removed
    /// entry. A miss leaves the subtree untouched.
    fn remove_walk(
        &mut self,
        id: NodeId,
        target: Target<'_, K>,
    ) -> (Option<NodeId>, Option<(K, V)>) {
        let removed = match self.direction(id, &target) {
            Ordering::Less => {
                let Some(less) = self.nodes[id].less else {
                    return (Some(id), None);
                };
                let (sub, removed) = self.remove_walk(less, target);
                self.set_child(id, Side::Less, sub);
                removed
            }
            Ordering::Greater => {
                let Some(greater) = self.nodes[id].greater else {
                    return (Some(id), None);
                };
                let (sub, removed) = self.remove_walk(greater, target);
                self.set_child(id, Side::Greater, sub);
                removed
            }
            Ordering::Equal => {
                if let Some(less) = self.nodes[id].less {
                    // Take over the predecessor's entry, then unlink the predecessor,
                    // which now carries the entry being removed.
                    let pred = self.nodes.rightmost(less);
                    self.nodes.swap_entries(id, pred);
                    let (sub, removed) = self.remove_walk(less, Target::Last);
                    self.set_child(id, Side::Less, sub);
                    removed
                } else if let Some(greater) = self.nodes[id].greater {
                    let succ = self.nodes.leftmost(greater);
                    self.nodes.swap_entries(id, succ);
                    let (sub, removed) = self.remove_walk(greater, Target::First);
                    self.set_child(id, Side::Greater, sub);
                    removed
                } else {
                    let node = self.nodes.free(id);
                    self.count -= 1;
                    return (None, Some((node.key, node.value)));
                }
            }
        };

        if removed.is_none() {
            return (Some(id), None);
        }
        (Some(self.rebalance_after_remove(id)), removed)
    }

    /// Lowers levels that lost support below `id`, then re-applies skew and
    /// split along the right spine. Returns the node now at `id`'s position.
    fn rebalance_after_remove(&mut self, id: NodeId) -> NodeId {
        let node = &self.nodes[id];
        let should = self.nodes.level(node.less).min(self.nodes.level(node.greater)) + 1;
        if node.level > should {
            self.nodes[id].level = should;
            if let Some(greater) = self.nodes[id].greater {
                if self.nodes[greater].level > should {
                    self.nodes[greater].level = should;
                }
            }
        }

        let top = self.skew(id);
        if let Some(greater) = self.nodes[top].greater {
            let greater = self.skew(greater);
            self.set_child(top, Side::Greater, Some(greater));
            if let Some(outer) = self.nodes[greater].greater {
                let outer = self.skew(outer);
                self.set_child(greater, Side::Greater, Some(outer));
            }
        }

        let top = self.split(top);
        if let Some(greater) = self.nodes[top].greater {
            let greater = self.split(greater);
            self.set_child(top, Side::Greater, Some(greater));
        }
        top
    }

    // -------------------------------------------------------------------------
    // Rebalancing primitives
    // -------------------------------------------------------------------------

    /// Right rotation removing a same-level `less` child.
    fn skew(&mut self, id: NodeId) -> NodeId {
        let Some(less) = self.nodes[id].less else {
            return id;
        };
        if self.nodes[less].level != self.nodes[id].level {
            return id;
        }

        let parent = self.nodes[id].parent;
        let inner = self.nodes[less].greater;
        self.set_child(id, Side::Less, inner);
        self.set_child(less, Side::Greater, Some(id));
        self.nodes[less].parent = parent;
        self.replace_child(parent, id, less);
        less
    }

    /// Left rotation breaking up three same-level nodes along the `greater`
    /// spine; the middle node moves up a level.
    fn split(&mut self, id: NodeId) -> NodeId {
        let Some(greater) = self.nodes[id].greater else {
            return id;
        };
        let Some(outer) = self.nodes[greater].greater else {
            return id;
        };
        if self.nodes[outer].level != self.nodes[id].level {
            return id;
        }
        debug_assert_eq!(self.nodes[greater].level, self.nodes[id].level);

        let parent = self.nodes[id].parent;
        let inner = self.nodes[greater].less;
        self.set_child(id, Side::Greater, inner);
        self.set_child(greater, Side::Less, Some(id));
        self.nodes[greater].parent = parent;
        self.nodes[greater].level += 1;
        self.replace_child(parent, id, greater);
        greater
    }

    /// Links `child` under `parent` on `side`, fixing the child's back-link.
    #[inline]
    fn set_child(&mut self, parent: NodeId, side: Side, child: Option<NodeId>) {
        match side {
            Side::Less => self.nodes[parent].less = child,
            Side::Greater => self.nodes[parent].greater = child,
        }
        if let Some(child) = child {
            self.nodes[child].parent = Some(parent);
        }
    }

    /// Points whatever referenced `old` (its parent's child slot, or the root)
    /// at `new`.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        let Some(parent) = parent else {
            self.root = Some(new);
            return;
        };
        let node = &mut self.nodes[parent];
        if node.less == Some(old) {
            node.less = Some(new);
        } else {
            debug_assert_eq!(node.greater, Some(old));
            node.greater = Some(new);
        }
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K: Ord, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for TreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            count: self.count,
            cmp: self.cmp.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, C: Compare<K>> IntoIterator for TreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C>;

    fn into_iter(self) -> IntoIter<K, V, C> {
        IntoIter { map: self }
    }
}


#[cfg(test)]
mod proptests;
