//! Trie core: descent, value slots, and the burst machinery.

pub(crate) mod node;

use core::mem;
use core::ptr::NonNull;

use crate::ahtable::{AhTable, RawAhIter};
use crate::config::{Value, TRIE_BUCKET_SIZE, TRIE_MAXCHAR};
use crate::slab::SlabCache;

use self::node::{
    NodePtr, TrieNode, NODE_CHILDS, NODE_HAS_VAL, NODE_TYPE_HYBRID_BUCKET, NODE_TYPE_PURE_BUCKET,
    NODE_TYPE_TRIE,
};

/// The raw container: a trie of branching nodes over array-hash buckets.
pub(crate) struct RawTrie {
    pub(crate) root: NodePtr,
    /// Number of stored keys.
    pub(crate) m: usize,
    slab: SlabCache,
}

/// Heap-allocates an empty bucket; the caller tags its header.
fn new_table() -> NodePtr {
    NodePtr::from_table(Box::leak(Box::new(AhTable::new())).into())
}

/// Releases a bucket allocated by `new_table`.
unsafe fn free_table(node: NodePtr) {
    drop(Box::from_raw(node.as_raw().as_ptr() as *mut AhTable));
}

/// Slab-allocates a trie node with every child slot pointing at `child`.
fn alloc_trie_node(slab: &mut SlabCache, child: NodePtr) -> NodePtr {
    let rec = slab.alloc().cast::<TrieNode>();
    unsafe {
        rec.as_ptr().write(TrieNode {
            flag: NODE_TYPE_TRIE,
            val: 0,
            xs: [child; NODE_CHILDS],
        });
    }
    NodePtr::from_trie(rec)
}

/// Walks trie edges until the key runs down to `brk` remaining bytes or a
/// bucket is reached.
///
/// `parent` tracks the last trie node entered. The return value is the
/// child selected by the key's current byte, or the trie node itself when
/// the key is exhausted on it (`brk == 0` only): that node's inbound edge
/// consumed the final byte, so the binding lives in its own value slot.
unsafe fn consume(parent: &mut NodePtr, key: &mut &[u8], brk: usize) -> NodePtr {
    debug_assert!(!key.is_empty());
    let mut node = parent.as_trie().xs[key[0] as usize];
    while node.is_trie() && key.len() > brk {
        *key = &key[1..];
        *parent = node;
        if key.is_empty() {
            return node;
        }
        node = node.as_trie().xs[key[0] as usize];
    }
    node
}

impl RawTrie {
    /// One root trie node over a single hybrid bucket spanning the whole
    /// alphabet.
    pub(crate) fn new() -> Self {
        // The record size is a compile-time constant far below the slab
        // payload, so the cache cannot reject it.
        let mut slab =
            SlabCache::new(mem::size_of::<TrieNode>()).expect("trie node record exceeds slab");
        let bucket = new_table();
        unsafe {
            let table = bucket.as_table_mut();
            table.flag = NODE_TYPE_HYBRID_BUCKET;
            table.c0 = 0x00;
            table.c1 = TRIE_MAXCHAR;
        }
        let root = alloc_trie_node(&mut slab, bucket);
        Self { root, m: 0, slab }
    }

    /// Marks the node's empty-suffix slot live and returns it.
    unsafe fn useval(&mut self, node: NodePtr) -> *mut Value {
        let t = node.as_trie_mut();
        if t.flag & NODE_HAS_VAL == 0 {
            t.flag |= NODE_HAS_VAL;
            self.m += 1;
        }
        &mut t.val
    }

    /// Clears the node's empty-suffix slot, returning the old binding.
    unsafe fn clrval(&mut self, node: NodePtr) -> Option<Value> {
        let t = node.as_trie_mut();
        if t.flag & NODE_HAS_VAL != 0 {
            t.flag &= !NODE_HAS_VAL;
            self.m -= 1;
            Some(mem::replace(&mut t.val, 0))
        } else {
            None
        }
    }

    /// Locates the node responsible for `key`, adjusting `key` to the
    /// suffix that node expects: a pure bucket's leading byte was already
    /// consumed by the parent edge.
    unsafe fn find(&self, key: &mut &[u8]) -> NodePtr {
        let mut parent = self.root;
        if key.is_empty() {
            return parent;
        }
        let node = consume(&mut parent, key, 1);
        if node.is_trie() {
            return node;
        }
        if node.is_pure() {
            *key = &key[1..];
        }
        node
    }

    /// Non-inserting lookup.
    pub(crate) fn tryget(&self, key: &[u8]) -> Option<NonNull<Value>> {
        unsafe {
            let mut k = key;
            let node = self.find(&mut k);
            if node.is_trie() {
                if node.flag() & NODE_HAS_VAL == 0 {
                    return None;
                }
                return Some(NonNull::from(&node.as_trie().val));
            }
            node.as_table().get(k).map(NonNull::from)
        }
    }

    /// Non-inserting lookup through a mutable container, so the slot can
    /// be written through.
    pub(crate) fn tryget_mut(&mut self, key: &[u8]) -> Option<NonNull<Value>> {
        unsafe {
            let mut k = key;
            let node = self.find(&mut k);
            if node.is_trie() {
                if node.flag() & NODE_HAS_VAL == 0 {
                    return None;
                }
                return Some(NonNull::from(&mut node.as_trie_mut().val));
            }
            node.as_table_mut().get_mut(k).map(NonNull::from)
        }
    }

    /// Value slot for `key`, created zero-initialized when absent. The
    /// second return tells whether the call inserted.
    pub(crate) fn get(&mut self, key: &[u8]) -> (NonNull<Value>, bool) {
        let m_old = self.m;
        let val = unsafe { self.get_inner(key) };
        (val, self.m != m_old)
    }

    unsafe fn get_inner(&mut self, key: &[u8]) -> NonNull<Value> {
        if key.is_empty() {
            let root = self.root;
            return NonNull::new_unchecked(self.useval(root));
        }

        let mut k = key;
        let mut parent = self.root;
        let mut node = consume(&mut parent, &mut k, 0);

        loop {
            // A key that ran out on the way down binds to a trie node's own
            // value slot, never to a bucket.
            if k.is_empty() {
                return if node.is_trie() {
                    NonNull::new_unchecked(self.useval(node))
                } else {
                    // Reaching a pure bucket consumes a byte, so only a
                    // hybrid can sit here; its empty residual belongs to
                    // the trie node above it.
                    debug_assert!(node.is_hybrid());
                    NonNull::new_unchecked(self.useval(parent))
                };
            }

            // Preemptively burst a full bucket. The split invalidates the
            // node pointer, so re-descend from the parent each round.
            if node.as_table().len() < TRIE_BUCKET_SIZE {
                break;
            }
            self.split(parent, node);
            node = consume(&mut parent, &mut k, 0);
        }

        let table = node.as_table_mut();
        let m_old = table.len();
        let val: *mut Value = if node.is_pure() {
            table.entry(&k[1..])
        } else {
            table.entry(k)
        };
        self.m += node.as_table().len() - m_old;
        NonNull::new_unchecked(val)
    }

    /// Removes `key`. Buckets are never merged back; bursts stay the only
    /// structural operation.
    pub(crate) fn del(&mut self, key: &[u8]) -> Option<Value> {
        unsafe {
            let mut k = key;
            let node = self.find(&mut k);
            if node.is_trie() {
                return self.clrval(node);
            }
            let table = node.as_table_mut();
            let m_old = table.len();
            let ret = table.remove(k);
            self.m -= m_old - table.len();
            ret
        }
    }

    /// Bursts a full bucket.
    ///
    /// A pure bucket is promoted: a fresh trie node takes its parent slot
    /// and the bucket is re-tagged hybrid over the whole alphabet beneath
    /// it, with no key moved. A hybrid bucket is split in two around a
    /// leading-byte pivot.
    unsafe fn split(&mut self, parent: NodePtr, node: NodePtr) {
        debug_assert!(parent.is_trie());
        debug_assert!(!node.is_trie());

        if node.is_pure() {
            let c = node.as_table().c0;
            debug_assert_eq!(c, node.as_table().c1);
            let t = alloc_trie_node(&mut self.slab, node);
            parent.as_trie_mut().xs[c as usize] = t;

            // An empty suffix stored in the bucket moves up into the new
            // trie node; the totals are untouched.
            let table = node.as_table_mut();
            if let Some(v) = table.remove(&[]) {
                let t = t.as_trie_mut();
                t.val = v;
                t.flag |= NODE_HAS_VAL;
            }
            table.c0 = 0x00;
            table.c1 = TRIE_MAXCHAR;
            table.flag = NODE_TYPE_HYBRID_BUCKET;
            return;
        }

        self.split_hybrid(parent, node);
    }

    /// Splits a hybrid bucket into `[c0, j]` and `[j + 1, c1]`.
    unsafe fn split_hybrid(&mut self, parent: NodePtr, node: NodePtr) {
        let j = split_mid(node);
        let (c0, c1) = {
            let t = node.as_table();
            (t.c0, t.c1)
        };

        // A side narrowed to one byte turns pure and needs a fresh table;
        // the side that stays hybrid reuses the original.
        let (left, right);
        if j + 1 == c1 {
            right = new_table();
            left = if j == c0 { new_table() } else { node };
        } else {
            right = node;
            left = new_table();
        }

        {
            let t = left.as_table_mut();
            t.c0 = c0;
            t.c1 = j;
            t.flag = if c0 == j {
                NODE_TYPE_PURE_BUCKET
            } else {
                NODE_TYPE_HYBRID_BUCKET
            };
        }
        {
            let t = right.as_table_mut();
            t.c0 = j + 1;
            t.c1 = c1;
            t.flag = if j + 1 == c1 {
                NODE_TYPE_PURE_BUCKET
            } else {
                NODE_TYPE_HYBRID_BUCKET
            };
        }

        let xs = &mut parent.as_trie_mut().xs;
        for c in c0..=j {
            xs[c as usize] = left;
        }
        for c in (j + 1)..=c1 {
            xs[c as usize] = right;
        }

        split_fill(node, left, right, j);
        if node != left && node != right {
            free_table(node);
        }
    }

    /// Frees every bucket under the root, each distinct child once. Trie
    /// node records are reclaimed in bulk when the slab cache drops.
    fn free_nodes(&mut self) {
        unsafe {
            let mut stack = vec![self.root];
            while let Some(node) = stack.pop() {
                if node.is_trie() {
                    let xs = &node.as_trie().xs;
                    for i in 0..NODE_CHILDS {
                        // A hybrid bucket spans a run of identical slots.
                        if i > 0 && xs[i] == xs[i - 1] {
                            continue;
                        }
                        stack.push(xs[i]);
                    }
                } else {
                    free_table(node);
                }
            }
        }
    }
}

impl Drop for RawTrie {
    fn drop(&mut self) {
        self.free_nodes();
        // The slab cache drops next, releasing the trie node records.
    }
}

/// Chooses the split byte for a hybrid bucket.
///
/// Greedily advances the pivot while the left/right key counts get no
/// worse, stopping at the first non-improving step and never handing every
/// key to one side.
unsafe fn split_mid(node: NodePtr) -> u8 {
    let table = node.as_table();

    // Occurrence count per leading byte.
    let mut cs = [0usize; NODE_CHILDS];
    let mut it = RawAhIter::new(node.as_raw().cast(), false);
    while !it.finished() {
        let key = it.key();
        debug_assert!(!key.is_empty());
        cs[key[0] as usize] += 1;
        it.next();
    }

    let all_m = table.len();
    let c1 = table.c1 as usize;
    let mut j = table.c0 as usize;
    let mut left_m = cs[j];
    let mut right_m = all_m - left_m;

    while j + 1 < c1 {
        let moved = cs[j + 1];
        let d = (left_m + moved) as i64 - (right_m - moved) as i64;
        if d.abs() <= (left_m as i64 - right_m as i64).abs() && left_m + moved < all_m {
            j += 1;
            left_m += cs[j];
            right_m -= cs[j];
        } else {
            break;
        }
    }

    j as u8
}

/// Redistributes the source bucket's keys around the pivot.
///
/// A key already sitting in its destination stays put; one copied out of a
/// reused source is deleted from it in place.
unsafe fn split_fill(src: NodePtr, left: NodePtr, right: NodePtr, split: u8) {
    let mut it = RawAhIter::new(src.as_raw().cast(), false);
    while !it.finished() {
        let key = it.key();
        let val = *it.val();
        debug_assert!(!key.is_empty());

        let (dst, other) = if key[0] > split {
            (right, left)
        } else {
            (left, right)
        };
        if src != dst {
            let table = dst.as_table_mut();
            if dst.is_pure() {
                table.insert(&key[1..], val);
            } else {
                table.insert(key, val);
            }
            if src == other {
                it.del();
                continue;
            }
        }
        it.next();
    }
}

#[cfg(test)]
impl RawTrie {
    /// Walks the whole structure, asserting the shape invariants and that
    /// the key count adds up.
    pub(crate) fn check(&self) {
        unsafe {
            let mut total = 0usize;
            let mut stack = vec![self.root];
            while let Some(node) = stack.pop() {
                assert!(node.is_trie());
                let t = node.as_trie();
                assert_eq!(t.flag & !NODE_HAS_VAL, NODE_TYPE_TRIE);
                if t.flag & NODE_HAS_VAL != 0 {
                    total += 1;
                }

                let mut i = 0;
                while i < NODE_CHILDS {
                    let child = t.xs[i];
                    if child.is_trie() {
                        stack.push(child);
                        i += 1;
                        continue;
                    }

                    // The slot run sharing this pointer must match the
                    // bucket's declared range.
                    let table = child.as_table();
                    let mut end = i;
                    while end + 1 < NODE_CHILDS && t.xs[end + 1] == child {
                        end += 1;
                    }
                    assert_eq!(table.c0 as usize, i);
                    assert_eq!(table.c1 as usize, end);
                    if child.is_pure() {
                        assert_eq!(i, end);
                    } else {
                        assert!(child.is_hybrid());
                        // Hybrid keys carry their leading byte, and it must
                        // fall inside the declared range.
                        for (key, _) in table.iter() {
                            assert!(!key.is_empty());
                            assert!(table.c0 <= key[0] && key[0] <= table.c1);
                        }
                    }
                    total += table.len();
                    i = end + 1;
                }
            }
            assert_eq!(total, self.m);
        }
    }
}
