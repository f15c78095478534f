use std::collections::BTreeMap;

use rand::rngs::ThreadRng;
use rand::Rng;

use qptrie::QpTrie;

fn clustered_key(rng: &mut ThreadRng) -> Vec<u8> {
    // Narrow alphabet so bounds frequently land inside compressed prefixes.
    let len = rng.gen_range(0..6);
    (0..len).map(|_| rng.gen_range(0u8..6)).collect()
}

#[test]
fn bounded_iterators_agree_with_a_btreemap() {
    let mut rng = ThreadRng::default();
    for _ in 0..64 {
        let mut model = BTreeMap::new();
        let mut trie: QpTrie<u32> = QpTrie::new();
        for tag in 0..48 {
            let key = clustered_key(&mut rng);
            model.insert(key.clone(), tag);
            trie = trie.insert(&key, tag);
        }
        let probe = clustered_key(&mut rng);

        let le: Vec<Vec<u8>> = trie.iter_less_or_equal(&probe).map(|(key, _)| key).collect();
        let mut le_model: Vec<Vec<u8>> = model.range(..=probe.clone()).map(|(key, _)| key.clone()).collect();
        le_model.reverse();
        assert_eq!(le, le_model);

        let ge: Vec<Vec<u8>> = trie.iter_greater_or_equal(&probe).map(|(key, _)| key).collect();
        let ge_model: Vec<Vec<u8>> = model.range(probe.clone()..).map(|(key, _)| key.clone()).collect();
        assert_eq!(ge, ge_model);
    }
}

#[test]
fn bounds_inside_a_compressed_prefix() {
    // Keys share the long run [1, 1, 1]; the probes end partway through it.
    let trie: QpTrie<&str> = QpTrie::new()
        .insert(&[1, 1, 1, 0], "low")
        .insert(&[1, 1, 1, 9], "high");

    let le: Vec<_> = trie.iter_less_or_equal(&[1, 1]).collect();
    assert!(le.is_empty());
    let ge: Vec<Vec<u8>> = trie.iter_greater_or_equal(&[1, 1]).map(|(key, _)| key).collect();
    assert_eq!(ge, vec![vec![1, 1, 1, 0], vec![1, 1, 1, 9]]);

    let le: Vec<Vec<u8>> = trie.iter_less_or_equal(&[1, 1, 1, 4]).map(|(key, _)| key).collect();
    assert_eq!(le, vec![vec![1, 1, 1, 0]]);
    let ge: Vec<Vec<u8>> = trie.iter_greater_or_equal(&[1, 1, 1, 4]).map(|(key, _)| key).collect();
    assert_eq!(ge, vec![vec![1, 1, 1, 9]]);

    let le: Vec<Vec<u8>> = trie.iter_less_or_equal(&[2]).map(|(key, _)| key).collect();
    assert_eq!(le, vec![vec![1, 1, 1, 9], vec![1, 1, 1, 0]]);
    let ge: Vec<_> = trie.iter_greater_or_equal(&[2]).collect();
    assert!(ge.is_empty());
}

#[test]
fn bound_equal_to_a_stored_key_is_inclusive_on_both_sides() {
    let trie: QpTrie<&str> = QpTrie::new()
        .insert(b"car", "a")
        .insert(b"cart", "b")
        .insert(b"cat", "c");

    let le: Vec<Vec<u8>> = trie.iter_less_or_equal(b"cart").map(|(key, _)| key).collect();
    assert_eq!(le, vec![b"cart".to_vec(), b"car".to_vec()]);

    let ge: Vec<Vec<u8>> = trie.iter_greater_or_equal(b"cart").map(|(key, _)| key).collect();
    assert_eq!(ge, vec![b"cart".to_vec(), b"cat".to_vec()]);
}
