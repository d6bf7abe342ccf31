use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Checks every structural invariant of the tree and panics on the first
/// violation.
pub(crate) fn validate_tree<K, V, C: Compare<K>>(t: &TreeMap<K, V, C>) {
    let Some(root) = t.root else {
        assert_eq!(t.count, 0, "empty tree must have zero length");
        return;
    };
    assert!(t.nodes[root].parent.is_none(), "root must not have a parent");

    let mut stack = vec![root];
    let mut node_count = 0usize;
    while let Some(id) = stack.pop() {
        node_count += 1;
        let node = &t.nodes[id];
        let level = node.level;
        assert!(level >= 1, "levels start at 1");

        match node.less {
            Some(less) => {
                let child = &t.nodes[less];
                assert_eq!(child.parent, Some(id), "less child has a stale parent link");
                assert_eq!(child.level + 1, level, "less child must sit one level down");
                assert_eq!(
                    t.cmp.compare(&child.key, &node.key),
                    Ordering::Less,
                    "less child must order before its parent"
                );
                stack.push(less);
            }
            None => assert_eq!(level, 1, "a node without a less child must be a leaf"),
        }

        if let Some(greater) = node.greater {
            let child = &t.nodes[greater];
            assert_eq!(child.parent, Some(id), "greater child has a stale parent link");
            assert!(
                child.level == level || child.level + 1 == level,
                "greater child level {} under level {}",
                child.level,
                level
            );
            assert_eq!(
                t.cmp.compare(&child.key, &node.key),
                Ordering::Greater,
                "greater child must order after its parent"
            );
            if let Some(outer) = child.greater {
                assert!(
                    t.nodes[outer].level < level,
                    "three nodes share level {} along the greater spine",
                    level
                );
            }
            stack.push(greater);
        }
    }
    assert_eq!(node_count, t.count, "reachable node count must match TreeMap::len");

    let keys: Vec<&K> = t.keys().collect();
    assert_eq!(keys.len(), t.count, "iteration must visit every entry");
    for pair in keys.windows(2) {
        assert_eq!(
            t.cmp.compare(pair[0], pair[1]),
            Ordering::Less,
            "iteration must be strictly increasing"
        );
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(u8, u32),
    #[proptest(weight = 3)]
    Remove(u8),
    #[proptest(weight = 2)]
    Get(u8),
    PopFirst,
    PopLast,
    Compact,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=1000)
}

/// Distinct keys paired with an independent removal order.
fn permutation_strategy() -> impl Strategy<Value = (Vec<u16>, Vec<u16>)> {
    prop::collection::btree_set(any::<u16>(), 0..=500)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
        .prop_flat_map(|keys| (Just(keys.clone()), Just(keys).prop_shuffle()))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: TreeMap<u8, u32> = TreeMap::new();
        let mut m: BTreeMap<u8, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
                Op::Compact => {
                    t.compact();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }

        prop_assert_eq!(t.first(), m.first_key_value());
        prop_assert_eq!(t.last(), m.last_key_value());
        let got: Vec<(u8, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_round_trip((inserts, removes) in permutation_strategy()) {
        let mut t: TreeMap<u16, u16> = TreeMap::new();
        for &k in &inserts {
            prop_assert_eq!(t.insert(k, k), None);
        }
        validate_tree(&t);

        let mut sorted = inserts.clone();
        sorted.sort_unstable();
        prop_assert_eq!(t.keys().copied().collect::<Vec<_>>(), sorted);

        for &k in &removes {
            prop_assert_eq!(t.remove(&k), Some(k));
            validate_tree(&t);
        }
        prop_assert_eq!(t.len(), 0);
        prop_assert!(t.first().is_none());
        prop_assert!(t.last().is_none());
    }

    #[test]
    fn prop_upsert_keeps_len(keys in prop::collection::vec(any::<u8>(), 1..200), key in any::<u8>()) {
        let mut t: TreeMap<u8, u32> = keys.iter().map(|&k| (k, 0)).collect();
        t.insert(key, 1);
        let len = t.len();
        prop_assert_eq!(t.insert(key, 2), Some(1));
        prop_assert_eq!(t.len(), len);
        prop_assert_eq!(t.get(&key), Some(&2));
        validate_tree(&t);
    }

    #[test]
    fn prop_remove_absent_is_noop(keys in prop::collection::btree_set(0u32..1000, 0..200), probe in 1000u32..2000) {
        let mut t: TreeMap<u32, u32> = keys.iter().map(|&k| (k, k)).collect();
        let before: Vec<(u32, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let root = t.root;

        prop_assert_eq!(t.remove(&probe), None);
        prop_assert_eq!(t.root, root);
        prop_assert_eq!(t.len(), keys.len());
        prop_assert_eq!(t.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), before);
    }

    #[test]
    fn prop_reverse_comparator(keys in prop::collection::vec(any::<i16>(), 0..300)) {
        let mut t = TreeMap::with_cmp(|a: &i16, b: &i16| b.cmp(a));
        for &k in &keys {
            t.insert(k, ());
        }
        validate_tree(&t);

        let mut expected = keys.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.dedup();
        prop_assert_eq!(t.keys().copied().collect::<Vec<_>>(), expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = vec![5, 3, 8, 1, 4, 7, 9];

    for_each_permutation(&keys, |perm| {
        let mut t: TreeMap<u32, u32> = TreeMap::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i as u32), None);
            validate_tree(&t);
        }
        assert_eq!(t.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4, 5, 7, 8, 9]);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = vec![5, 3, 8, 1, 4, 7, 9];

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: TreeMap<u32, u32> = TreeMap::new();
    let mut base_map: BTreeMap<u32, u32> = BTreeMap::new();
    for (i, &k) in keys.iter().enumerate() {
        let v = i as u32;
        assert_eq!(base_tree.insert(k, v), base_map.insert(k, v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
            let got: Vec<(u32, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
            let expected: Vec<(u32, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(got, expected);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_none());
    });
}
