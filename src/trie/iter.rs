//! Depth-first traversal, rebuilding keys without parent pointers.

use core::marker::PhantomData;

use crate::ahtable::RawAhIter;
use crate::config::Value;
use crate::trie::raw::node::{NodePtr, NODE_CHILDS, NODE_HAS_VAL};
use crate::trie::HatTrie;

/// A pending subtree: the node, the byte on its inbound edge, and the key
/// length at which that byte sits.
struct Frame {
    node: NodePtr,
    c: u8,
    level: usize,
}

/// Streaming cursor over a trie's `(key, value)` pairs.
///
/// The key is rebuilt in a cursor-owned buffer as the walk descends, so
/// the slice returned by [`Iter::key`] is valid until the cursor advances.
/// With `sorted`, keys come out in ascending lexicographic order; a trie
/// node's own empty-suffix binding is emitted before its subtree, which is
/// exactly where the shorter prefix sorts.
pub struct Iter<'a> {
    key: Vec<u8>,
    /// Bytes of prefix committed so far.
    level: usize,
    /// Latched trie-node binding, emitted before the node's children.
    has_nil_key: bool,
    nil_val: Value,
    sorted: bool,
    bucket: Option<RawAhIter>,
    stack: Vec<Frame>,
    marker: PhantomData<&'a HatTrie>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(trie: &'a HatTrie, sorted: bool) -> Self {
        let mut it = Self {
            key: Vec::with_capacity(16),
            level: 0,
            has_nil_key: false,
            nil_val: 0,
            sorted,
            bucket: None,
            stack: vec![Frame {
                node: trie.raw.root,
                c: 0,
                level: 0,
            }],
            marker: PhantomData,
        };
        it.settle();
        it
    }

    /// `true` once every pair has been yielded.
    pub fn finished(&self) -> bool {
        self.stack.is_empty() && self.bucket.is_none() && !self.has_nil_key
    }

    /// Steps to the next pair.
    pub fn next(&mut self) {
        if self.finished() {
            return;
        }
        match &mut self.bucket {
            Some(b) if !b.finished() => unsafe { b.next() },
            _ => {
                if self.has_nil_key {
                    self.has_nil_key = false;
                    self.nil_val = 0;
                    self.advance_node();
                }
            }
        }
        self.settle();
    }

    /// The current key. Valid until the cursor advances.
    pub fn key(&mut self) -> Option<&[u8]> {
        if self.finished() {
            return None;
        }
        let sub: &[u8] = if self.has_nil_key {
            &[]
        } else {
            match &self.bucket {
                Some(b) => unsafe { b.key() },
                None => &[],
            }
        };
        let total = self.level + sub.len();
        if self.key.len() < total {
            self.key.resize(total, 0);
        }
        self.key[self.level..total].copy_from_slice(sub);
        Some(&self.key[..total])
    }

    /// The current value. Valid until the cursor advances.
    pub fn value(&self) -> Option<&Value> {
        if self.has_nil_key {
            return Some(&self.nil_val);
        }
        if self.finished() {
            return None;
        }
        match &self.bucket {
            Some(b) => Some(unsafe { b.val() }),
            None => None,
        }
    }

    /// Runs the walk forward until it rests on a yieldable position: a
    /// bucket entry, a latched trie-node binding, or the end.
    fn settle(&mut self) {
        while self.bucket.as_ref().map_or(true, |b| b.finished())
            && !self.has_nil_key
            && !self.stack.is_empty()
        {
            self.bucket = None;
            self.advance_node();
        }
        if self.bucket.as_ref().map_or(false, |b| b.finished()) {
            self.bucket = None;
        }
    }

    /// Pops the next pending node and positions on it.
    fn advance_node(&mut self) {
        let Frame { node, c, level } = match self.stack.pop() {
            Some(frame) => frame,
            None => return,
        };

        unsafe {
            if node.is_trie() {
                self.push_char(level, c);

                let t = node.as_trie();
                if t.flag & NODE_HAS_VAL != 0 {
                    self.has_nil_key = true;
                    self.nil_val = t.val;
                }

                // Children go on the stack in reverse byte order so they
                // pop ascending; a hybrid bucket's run of identical slots
                // is pushed once.
                for j in (0..NODE_CHILDS).rev() {
                    if j < NODE_CHILDS - 1 && t.xs[j] == t.xs[j + 1] {
                        continue;
                    }
                    self.stack.push(Frame {
                        node: t.xs[j],
                        c: j as u8,
                        level: level + 1,
                    });
                }
            } else {
                if node.is_pure() {
                    self.push_char(level, c);
                } else {
                    // Hybrid bucket keys carry their own leading byte; step
                    // back one so it overwrites the edge byte.
                    self.level = level - 1;
                }
                self.bucket = Some(RawAhIter::new(node.as_raw().cast(), self.sorted));
            }
        }
    }

    /// Commits the inbound edge byte at `level - 1` and records the new
    /// prefix length.
    fn push_char(&mut self, level: usize, c: u8) {
        if self.key.len() < level {
            self.key.resize(level, 0);
        }
        if level > 0 {
            self.key[level - 1] = c;
        }
        self.level = level;
    }
}
