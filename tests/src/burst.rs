use hattrie::config::TRIE_BUCKET_SIZE;
use hattrie::HatTrie;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collect;

#[test]
fn twenty_thousand_keys() {
    let mut trie = HatTrie::new();
    for i in 0u32..20_000 {
        trie.insert(&i.to_le_bytes(), u64::from(i));
    }
    assert_eq!(trie.len(), 20_000);
    for i in 0u32..20_000 {
        assert_eq!(trie.get(&i.to_le_bytes()), Some(&u64::from(i)));
    }

    let pairs = collect(trie.iter_sorted());
    assert_eq!(pairs.len(), 20_000);
    for w in pairs.windows(2) {
        assert!(w[0].0 < w[1].0);
    }
}

#[test]
fn shared_prefix_promotes_to_trie_node() {
    let mut trie = HatTrie::new();
    let mut rng = StdRng::seed_from_u64(0x9a75);

    let mut suffixes = Vec::new();
    while suffixes.len() < TRIE_BUCKET_SIZE + 1 {
        let mut key = vec![b'q'];
        for _ in 0..8 {
            key.push(rng.gen::<u8>());
        }
        if trie.contains_key(&key) {
            continue;
        }
        trie.insert(&key, suffixes.len() as u64);
        suffixes.push(key.split_off(1));
    }

    assert_eq!(trie.len(), TRIE_BUCKET_SIZE + 1);
    // The shared one-byte prefix is not a key unless inserted itself.
    assert_eq!(trie.get(b"q"), None);
    for (i, suffix) in suffixes.iter().enumerate() {
        let mut key = vec![b'q'];
        key.extend_from_slice(suffix);
        assert_eq!(trie.get(&key), Some(&(i as u64)));
    }

    trie.insert(b"q", 9999);
    assert_eq!(trie.get(b"q"), Some(&9999));
    assert_eq!(trie.len(), TRIE_BUCKET_SIZE + 2);
}

#[test]
fn bursts_leave_no_key_behind() {
    // Two-byte coverage plus deeper keys around the burst threshold.
    let mut trie = HatTrie::new();
    let n = (TRIE_BUCKET_SIZE + 256) as u32;
    for i in 0..n {
        let key = [(i % 251) as u8, (i / 251) as u8, (i % 7) as u8];
        *trie.entry(&key[..(1 + (i as usize % 3))]) += 1;
    }
    // Every entry call either created or bumped a binding; the totals of
    // the values must add up to the number of calls.
    let pairs = collect(trie.iter());
    let total: u64 = pairs.iter().map(|(_, v)| v).sum();
    assert_eq!(total, u64::from(n));
    assert_eq!(trie.len(), pairs.len());
}

#[test]
fn values_survive_bursts() {
    let mut trie = HatTrie::new();
    let n = (2 * TRIE_BUCKET_SIZE) as u32;
    for i in 0..n {
        trie.insert(&i.to_be_bytes(), u64::from(i) * 3);
    }
    for i in 0..n {
        assert_eq!(trie.get(&i.to_be_bytes()), Some(&(u64::from(i) * 3)));
    }
    assert_eq!(trie.len(), n as usize);
}
