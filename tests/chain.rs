// Chain integration tests (public API only).
//
// Invariants exercised:
// - Order: push_back preserves insertion order; iteration is head to tail.
// - Length: len always equals the number of reachable elements.
// - Positional edits: out-of-range insert/remove never change the chain.
use chained_hashtable::{Chain, OutOfRange};

// Test: a chain built from an iterator behaves like the sequence it came from.
#[test]
fn collect_and_walk() {
    let c: Chain<&str> = ["x", "y", "z"].into_iter().collect();
    assert_eq!(c.len(), 3);
    assert_eq!(c.iter().copied().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    assert_eq!(c.find(|s| *s == "z"), Some(2));
    assert_eq!(c.get(1), Some(&"y"));
}

// Test: out-of-range positions.
// Verifies: insert hands the value back; remove is a no-op.
#[test]
fn out_of_range_positions() {
    let mut c: Chain<u8> = Chain::new();
    assert_eq!(
        c.insert(1, 7),
        Err(OutOfRange {
            position: 1,
            len: 0,
            value: 7
        })
    );
    assert_eq!(c.remove(0), None);
    c.insert(0, 7).unwrap();
    assert_eq!(c.len(), 1);
}

// Test: mixed edits keep len consistent with iteration.
#[test]
fn len_tracks_edits() {
    let mut c: Chain<i32> = (0..10).collect();
    c.remove_matching(|v| v % 3 == 0);
    c.push_front(-1);
    c.insert(2, 100).unwrap();
    c.pop_back();
    assert_eq!(c.len(), c.iter().count());
    assert_eq!(c.to_vec(), vec![-1, 1, 100, 2, 4, 5, 7]);
}

// Test: transforms produce new chains and leave the source alone.
#[test]
fn transforms_are_non_destructive() {
    let c: Chain<String> = ["a", "bb", "ccc"].iter().map(|s| s.to_string()).collect();
    let lens = c.map(|s| s.len());
    assert_eq!(lens.to_vec(), vec![1, 2, 3]);
    let long = c.filter(|s| s.len() > 1);
    assert_eq!(long.len(), 2);
    let both = c.joined(&c);
    assert_eq!(both.len(), 6);
    assert_eq!(c.len(), 3);
}
