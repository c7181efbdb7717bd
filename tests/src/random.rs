use std::collections::HashMap;

use hattrie::HatTrie;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collect;

fn random_key(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(0, 16);
    (0..len).map(|_| rng.gen::<u8>()).collect()
}

#[test]
fn delete_every_other_key() {
    let mut trie = HatTrie::new();
    let keys: Vec<Vec<u8>> = (0u32..1000).map(|i| i.to_le_bytes().to_vec()).collect();
    for (i, key) in keys.iter().enumerate() {
        trie.insert(key, i as u64);
    }
    for (i, key) in keys.iter().enumerate() {
        if i % 2 == 1 {
            assert_eq!(trie.remove(key), Some(i as u64));
        }
    }
    assert_eq!(trie.len(), 500);
    for (i, key) in keys.iter().enumerate() {
        if i % 2 == 1 {
            assert_eq!(trie.get(key), None);
        } else {
            assert_eq!(trie.get(key), Some(&(i as u64)));
        }
    }
}

#[test]
fn sorted_and_unsorted_agree() {
    let mut trie = HatTrie::new();
    let mut model = HashMap::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for i in 0..5000u64 {
        let key = random_key(&mut rng);
        model.insert(key.clone(), i);
        trie.insert(&key, i);
    }
    assert_eq!(trie.len(), model.len());

    let sorted = collect(trie.iter_sorted());
    let mut unsorted = collect(trie.iter());

    // Same multiset either way.
    assert_eq!(sorted.len(), model.len());
    unsorted.sort();
    let mut resorted = sorted.clone();
    resorted.sort();
    assert_eq!(resorted, unsorted);

    // The sorted walk is strictly ascending and matches the model.
    for w in sorted.windows(2) {
        assert!(w[0].0 < w[1].0);
    }
    for (key, val) in &sorted {
        assert_eq!(model.get(key), Some(val));
    }
}

#[test]
fn behaves_like_a_map() {
    let mut trie = HatTrie::new();
    let mut model: HashMap<Vec<u8>, u64> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(0xfeed);

    for round in 0..50_000u64 {
        let key = random_key(&mut rng);
        match rng.gen_range(0, 4) {
            0 | 1 => {
                assert_eq!(trie.insert(&key, round), model.insert(key, round));
            }
            2 => {
                assert_eq!(trie.remove(&key), model.remove(&key));
            }
            _ => {
                assert_eq!(trie.get(&key), model.get(&key));
            }
        }
        assert_eq!(trie.len(), model.len());
    }

    for (key, val) in &model {
        assert_eq!(trie.get(key), Some(val));
    }
    let pairs = collect(trie.iter_sorted());
    assert_eq!(pairs.len(), model.len());
}

#[test]
fn reinserting_deleted_keys() {
    let mut trie = HatTrie::new();
    let keys: Vec<Vec<u8>> = (0u32..2000).map(|i| i.to_be_bytes().to_vec()).collect();
    for key in &keys {
        trie.insert(key, 1);
    }
    for key in &keys {
        trie.remove(key);
    }
    assert_eq!(trie.len(), 0);
    assert!(trie.is_empty());
    for key in &keys {
        assert_eq!(trie.insert(key, 2), None);
    }
    assert_eq!(trie.len(), keys.len());
    for key in &keys {
        assert_eq!(trie.get(key), Some(&2));
    }
}
