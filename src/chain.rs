//! Chain: a singly linked list whose nodes live in a generational arena.
//!
//! Nodes are stored in a `SlotMap` and linked through `next` handles rather
//! than pointers. `head` and `tail` handles keep pushes at either end O(1);
//! positional access walks from the head, so `get`/`remove` are O(position).
//!
//! A chain is the bucket representation of `HashTable` and the container
//! returned by its bulk queries, but it is a complete list on its own.

use crate::error::OutOfRange;
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: Option<DefaultKey>,
}

/// Ordered, singly linked sequence. Length always equals the number of live
/// nodes in the arena.
pub struct Chain<T> {
    nodes: SlotMap<DefaultKey, Node<T>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<T> Chain<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.value_of(self.head?)
    }

    pub fn last(&self) -> Option<&T> {
        self.value_of(self.tail?)
    }

    /// Element at `position`, or `None` past the end.
    pub fn get(&self, position: usize) -> Option<&T> {
        self.value_of(self.key_at(position)?)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut T> {
        let key = self.key_at(position)?;
        self.nodes.get_mut(key).map(|n| &mut n.value)
    }

    /// Position of the first element matching `pred`, scanning from the head.
    pub fn find<F>(&self, pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().position(pred)
    }

    pub fn count_matching<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|&v| pred(v)).count()
    }

    pub fn push_front(&mut self, value: T) {
        let key = self.nodes.insert(Node {
            value,
            next: self.head,
        });
        if self.tail.is_none() {
            self.tail = Some(key);
        }
        self.head = Some(key);
    }

    /// Append at the tail, preserving insertion order.
    pub fn push_back(&mut self, value: T) {
        let key = self.nodes.insert(Node { value, next: None });
        match self.tail.and_then(|t| self.nodes.get_mut(t)) {
            Some(tail) => tail.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
    }

    /// Insert so that `value` ends up at `position`. `position == len()`
    /// appends; anything larger hands the value back.
    pub fn insert(&mut self, position: usize, value: T) -> Result<(), OutOfRange<T>> {
        let len = self.len();
        if position > len {
            return Err(OutOfRange {
                position,
                len,
                value,
            });
        }
        if position == 0 {
            self.push_front(value);
        } else if position == len {
            self.push_back(value);
        } else {
            let Some(prev) = self.key_at(position - 1) else {
                return Err(OutOfRange {
                    position,
                    len,
                    value,
                });
            };
            let next = self.next_of(prev);
            let key = self.nodes.insert(Node { value, next });
            if let Some(node) = self.nodes.get_mut(prev) {
                node.next = Some(key);
            }
        }
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.nodes.remove(self.head?)?;
        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        Some(node.value)
    }

    /// O(len): the predecessor of the tail has to be found from the head.
    pub fn pop_back(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.remove(len - 1)
    }

    /// Unlink the node at `position` and return its payload. Out of range is
    /// a no-op returning `None`.
    pub fn remove(&mut self, position: usize) -> Option<T> {
        if position >= self.len() {
            return None;
        }
        if position == 0 {
            return self.pop_front();
        }
        let prev = self.key_at(position - 1)?;
        let key = self.next_of(prev)?;
        let node = self.nodes.remove(key)?;
        if let Some(p) = self.nodes.get_mut(prev) {
            p.next = node.next;
        }
        if self.tail == Some(key) {
            self.tail = Some(prev);
        }
        Some(node.value)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Remove every element matching `pred`; returns how many were removed.
    pub fn remove_matching<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.unlink_where(|v| pred(v))
    }

    /// Keep the first element matching `pred` and remove the later ones.
    /// Returns the number of matches seen, including the one kept.
    pub fn dedup_matching<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut seen = 0;
        self.unlink_where(|v| {
            if pred(v) {
                seen += 1;
                seen > 1
            } else {
                false
            }
        });
        seen
    }

    pub fn map<U, F>(&self, f: F) -> Chain<U>
    where
        F: FnMut(&T) -> U,
    {
        self.iter().map(f).collect()
    }

    pub fn filter<F>(&self, mut pred: F) -> Chain<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|&v| pred(v)).collect()
    }

    /// New chain holding this chain's elements followed by `other`'s.
    pub fn joined(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Elements from `start` through `end`, both inclusive.
    pub fn sublist(&self, start: usize, end: usize) -> Option<Chain<&T>> {
        if end < start || end >= self.len() {
            return None;
        }
        Some(self.iter().skip(start).take(end - start + 1).collect())
    }

    /// Elements at the given positions, in the order given.
    pub fn select(&self, positions: &[usize]) -> Option<Chain<&T>> {
        if positions.is_empty() {
            return None;
        }
        positions.iter().map(|&p| self.get(p)).collect()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    fn value_of(&self, key: DefaultKey) -> Option<&T> {
        self.nodes.get(key).map(|n| &n.value)
    }

    fn next_of(&self, key: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(key).and_then(|n| n.next)
    }

    fn key_at(&self, position: usize) -> Option<DefaultKey> {
        if position >= self.len() {
            return None;
        }
        let mut cur = self.head;
        for _ in 0..position {
            cur = self.next_of(cur?);
        }
        cur
    }

    fn unlink_where<F>(&mut self, mut doomed: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = 0;
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.head;
        while let Some(key) = cur {
            let (hit, next) = match self.nodes.get(key) {
                Some(node) => (doomed(&node.value), node.next),
                None => break,
            };
            if hit {
                self.nodes.remove(key);
                match prev.and_then(|p| self.nodes.get_mut(p)) {
                    Some(p) => p.next = next,
                    None => self.head = next,
                }
                if next.is_none() {
                    self.tail = prev;
                }
                removed += 1;
            } else {
                prev = Some(key);
            }
            cur = next;
        }
        removed
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Chain<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for Chain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Chain<T> {}

impl<T: fmt::Debug> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        chain.extend(iter);
        chain
    }
}

impl<T> Extend<T> for Chain<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

/// Head-to-tail cursor over a chain.
pub struct Iter<'a, T> {
    nodes: &'a SlotMap<DefaultKey, Node<T>>,
    cursor: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = nodes.get(self.cursor?)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Owning iterator; drains the chain from the head.
pub struct IntoIter<T> {
    chain: Chain<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.chain.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.chain.len();
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for Chain<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { chain: self }
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(values: &[i32]) -> Chain<i32> {
        values.iter().copied().collect()
    }

    #[test]
    fn push_back_preserves_insertion_order() {
        let mut c = Chain::new();
        assert!(c.is_empty());
        c.push_back(1);
        c.push_back(2);
        c.push_back(3);
        assert_eq!(c.len(), 3);
        assert_eq!(c.to_vec(), vec![1, 2, 3]);
        assert_eq!(c.first(), Some(&1));
        assert_eq!(c.last(), Some(&3));
    }

    #[test]
    fn push_front_on_empty_sets_tail() {
        let mut c = Chain::new();
        c.push_front(2);
        c.push_front(1);
        c.push_back(3);
        assert_eq!(c.to_vec(), vec![1, 2, 3]);
        assert_eq!(c.last(), Some(&3));
    }

    #[test]
    fn positional_get_and_get_mut() {
        let mut c = chain_of(&[10, 20, 30]);
        assert_eq!(c.get(0), Some(&10));
        assert_eq!(c.get(2), Some(&30));
        assert_eq!(c.get(3), None);

        *c.get_mut(1).unwrap() += 1;
        assert_eq!(c.get(1), Some(&21));
        assert!(c.get_mut(7).is_none());
    }

    #[test]
    fn find_returns_first_match_without_mutating() {
        let c = chain_of(&[5, 7, 7, 9]);
        assert_eq!(c.find(|&v| v == 7), Some(1));
        assert_eq!(c.find(|&v| v == 4), None);
        assert_eq!(c.count_matching(|&v| v == 7), 2);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn insert_at_every_position() {
        let mut c = chain_of(&[2, 4]);
        c.insert(0, 1).unwrap();
        c.insert(2, 3).unwrap();
        c.insert(4, 5).unwrap();
        assert_eq!(c.to_vec(), vec![1, 2, 3, 4, 5]);
        assert_eq!(c.last(), Some(&5));

        let err = c.insert(9, 99).unwrap_err();
        assert_eq!(err.position, 9);
        assert_eq!(err.len, 5);
        assert_eq!(err.value, 99);
        assert_eq!(c.len(), 5);
    }

    #[test]
    fn remove_head_middle_tail() {
        let mut c = chain_of(&[1, 2, 3, 4]);
        assert_eq!(c.remove(1), Some(2));
        assert_eq!(c.remove(0), Some(1));
        assert_eq!(c.remove(1), Some(4));
        assert_eq!(c.last(), Some(&3));
        assert_eq!(c.first(), Some(&3));

        // Tail must be rewired: appending after removing the tail.
        c.push_back(5);
        assert_eq!(c.to_vec(), vec![3, 5]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut c = chain_of(&[1]);
        assert_eq!(c.remove(1), None);
        assert_eq!(c.len(), 1);
        let mut empty: Chain<i32> = Chain::new();
        assert_eq!(empty.remove(0), None);
        assert_eq!(empty.pop_front(), None);
        assert_eq!(empty.pop_back(), None);
    }

    #[test]
    fn pop_both_ends_until_empty() {
        let mut c = chain_of(&[1, 2, 3]);
        assert_eq!(c.pop_back(), Some(3));
        assert_eq!(c.pop_front(), Some(1));
        assert_eq!(c.pop_back(), Some(2));
        assert!(c.is_empty());
        assert_eq!(c.first(), None);
        assert_eq!(c.last(), None);
        c.push_back(8);
        assert_eq!(c.to_vec(), vec![8]);
    }

    #[test]
    fn remove_matching_fixes_head_and_tail() {
        let mut c = chain_of(&[1, 2, 1, 3, 1]);
        assert_eq!(c.remove_matching(|&v| v == 1), 3);
        assert_eq!(c.to_vec(), vec![2, 3]);
        assert_eq!(c.first(), Some(&2));
        assert_eq!(c.last(), Some(&3));
        c.push_back(4);
        assert_eq!(c.to_vec(), vec![2, 3, 4]);

        assert_eq!(c.remove_matching(|_| true), 3);
        assert!(c.is_empty());
        c.push_back(9);
        assert_eq!(c.to_vec(), vec![9]);
    }

    #[test]
    fn dedup_keeps_first_match() {
        let mut c = chain_of(&[7, 1, 7, 2, 7]);
        assert_eq!(c.dedup_matching(|&v| v == 7), 3);
        assert_eq!(c.to_vec(), vec![7, 1, 2]);
        assert_eq!(c.last(), Some(&2));
        assert_eq!(c.dedup_matching(|&v| v == 5), 0);
    }

    #[test]
    fn functional_transforms() {
        let c = chain_of(&[1, 2, 3, 4]);
        let doubled = c.map(|v| v * 2);
        assert_eq!(doubled.to_vec(), vec![2, 4, 6, 8]);

        let evens = c.filter(|v| v % 2 == 0);
        assert_eq!(evens.iter().map(|v| **v).collect::<Vec<_>>(), vec![2, 4]);

        let joined = c.joined(&chain_of(&[5]));
        assert_eq!(joined.to_vec(), vec![1, 2, 3, 4, 5]);
        assert_eq!(c.len(), 4, "join leaves its inputs alone");
    }

    #[test]
    fn sublist_and_select() {
        let c = chain_of(&[10, 11, 12, 13]);
        let mid = c.sublist(1, 2).unwrap();
        assert_eq!(mid.to_vec(), vec![&11, &12]);
        assert!(c.sublist(2, 1).is_none());
        assert!(c.sublist(0, 4).is_none());

        let picked = c.select(&[3, 0, 3]).unwrap();
        assert_eq!(picked.to_vec(), vec![&13, &10, &13]);
        assert!(c.select(&[]).is_none());
        assert!(c.select(&[0, 4]).is_none());
    }

    #[test]
    fn iterators_agree_on_order_and_length() {
        let c = chain_of(&[3, 1, 2]);
        let it = c.iter();
        assert_eq!(it.len(), 3);
        let borrowed: Vec<i32> = (&c).into_iter().copied().collect();
        let owned: Vec<i32> = c.into_iter().collect();
        assert_eq!(borrowed, owned);
        assert_eq!(owned, vec![3, 1, 2]);
    }

    #[test]
    fn clear_then_reuse() {
        let mut c = chain_of(&[1, 2]);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.iter().count(), 0);
        c.extend([4, 5]);
        assert_eq!(c.to_vec(), vec![4, 5]);
    }

    #[test]
    fn equality_clone_and_debug() {
        let a = chain_of(&[1, 2]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, chain_of(&[1]));
        assert_eq!(format!("{:?}", a), "[1, 2]");
    }

    #[test]
    fn slots_are_reused_without_breaking_links() {
        let mut c = Chain::new();
        for i in 0..8 {
            c.push_back(i);
        }
        for _ in 0..4 {
            c.remove(1);
        }
        c.insert(1, 100).unwrap();
        c.push_front(-1);
        assert_eq!(c.to_vec(), vec![-1, 0, 100, 5, 6, 7]);
    }
}
