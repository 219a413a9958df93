//! Ordered merge-join of two key-sorted record streams.
//!
//! Both dataset dumps are sorted by title id, so pairing `title.basics` with
//! `title.ratings` needs one forward pass and constant memory. Keys present
//! on only one side are dropped.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

/// A record with a sort key.
pub trait Keyed {
    type Key: Ord + Copy + fmt::Debug + fmt::Display;

    fn key(&self) -> Self::Key;
}

/// Which input of a join an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// An input yielded a key that is not greater than the one before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{side} input is not strictly ascending: key {current} follows {previous}")]
pub struct OrderViolation {
    pub side: Side,
    pub previous: String,
    pub current: String,
}

/// Iterator returned by [`merge_join`].
///
/// Yields `(left, right)` for every key present in both inputs, ascending.
/// The first error from either input, or an [`OrderViolation`], is yielded
/// once and ends the join.
#[derive(Debug)]
pub struct MergeJoin<L, R, A, B, E>
where
    A: Keyed,
    B: Keyed<Key = A::Key>,
{
    left: L,
    right: R,
    last_left: Option<A::Key>,
    last_right: Option<A::Key>,
    done: bool,
    _items: PhantomData<fn() -> (A, B, E)>,
}

/// Join two streams that are each strictly ascending by key.
pub fn merge_join<L, R, A, B, E>(left: L, right: R) -> MergeJoin<L::IntoIter, R::IntoIter, A, B, E>
where
    L: IntoIterator<Item = Result<A, E>>,
    R: IntoIterator<Item = Result<B, E>>,
    A: Keyed,
    B: Keyed<Key = A::Key>,
    E: From<OrderViolation>,
{
    MergeJoin {
        left: left.into_iter(),
        right: right.into_iter(),
        last_left: None,
        last_right: None,
        done: false,
        _items: PhantomData,
    }
}

/// Advance one input, checking it stays strictly ascending.
fn pull<I, T, E>(input: &mut I, last: &mut Option<T::Key>, side: Side) -> Result<Option<T>, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Keyed,
    E: From<OrderViolation>,
{
    let Some(item) = input.next().transpose()? else {
        return Ok(None);
    };
    let key = item.key();
    if let Some(previous) = *last {
        if key <= previous {
            return Err(OrderViolation {
                side,
                previous: previous.to_string(),
                current: key.to_string(),
            }
            .into());
        }
    }
    *last = Some(key);
    Ok(Some(item))
}

impl<L, R, A, B, E> MergeJoin<L, R, A, B, E>
where
    L: Iterator<Item = Result<A, E>>,
    R: Iterator<Item = Result<B, E>>,
    A: Keyed,
    B: Keyed<Key = A::Key>,
    E: From<OrderViolation>,
{
    fn step(&mut self) -> Result<Option<(A, B)>, E> {
        let Some(mut left) = pull(&mut self.left, &mut self.last_left, Side::Left)? else {
            return Ok(None);
        };
        let Some(mut right) = pull(&mut self.right, &mut self.last_right, Side::Right)? else {
            return Ok(None);
        };

        loop {
            match left.key().cmp(&right.key()) {
                Ordering::Equal => return Ok(Some((left, right))),
                Ordering::Less => {
                    match pull(&mut self.left, &mut self.last_left, Side::Left)? {
                        Some(next) => left = next,
                        None => return Ok(None),
                    }
                }
                Ordering::Greater => {
                    match pull(&mut self.right, &mut self.last_right, Side::Right)? {
                        Some(next) => right = next,
                        None => return Ok(None),
                    }
                }
            }
        }
    }
}

impl<L, R, A, B, E> Iterator for MergeJoin<L, R, A, B, E>
where
    L: Iterator<Item = Result<A, E>>,
    R: Iterator<Item = Result<B, E>>,
    A: Keyed,
    B: Keyed<Key = A::Key>,
    E: From<OrderViolation>,
{
    type Item = Result<(A, B), E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<L, R, A, B, E> std::iter::FusedIterator for MergeJoin<L, R, A, B, E>
where
    L: Iterator<Item = Result<A, E>>,
    R: Iterator<Item = Result<B, E>>,
    A: Keyed,
    B: Keyed<Key = A::Key>,
    E: From<OrderViolation>,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Item(u32, char);

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }
    }

    #[derive(Debug, PartialEq)]
    enum TestError {
        Order(OrderViolation),
        Source(&'static str),
    }

    impl From<OrderViolation> for TestError {
        fn from(err: OrderViolation) -> Self {
            Self::Order(err)
        }
    }

    fn items(keys: &[u32], tag: char) -> Vec<Result<Item, TestError>> {
        keys.iter().map(|&key| Ok(Item(key, tag))).collect()
    }

    fn join_keys(left: &[u32], right: &[u32]) -> Vec<u32> {
        merge_join(items(left, 'l'), items(right, 'r'))
            .map(|pair| pair.map(|(l, _)| l.0))
            .collect::<Result<_, TestError>>()
            .unwrap()
    }

    #[test]
    fn test_partial_overlap() {
        assert_eq!(join_keys(&[1, 2, 3], &[2, 3, 4]), vec![2, 3]);
    }

    #[test]
    fn test_pairs_carry_both_sides() {
        let pairs: Vec<(Item, Item)> = merge_join(items(&[5], 'l'), items(&[5], 'r'))
            .collect::<Result<_, TestError>>()
            .unwrap();
        assert_eq!(pairs, vec![(Item(5, 'l'), Item(5, 'r'))]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(join_keys(&[], &[]).is_empty());
        assert!(join_keys(&[1, 2], &[]).is_empty());
        assert!(join_keys(&[], &[1, 2]).is_empty());
    }

    #[test]
    fn test_disjoint_and_identical() {
        assert!(join_keys(&[1, 3, 5], &[2, 4, 6]).is_empty());
        assert_eq!(join_keys(&[1, 2, 3], &[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_sparse_keys() {
        assert_eq!(
            join_keys(&[1, 4, 9, 16, 25, 36], &[2, 4, 8, 16, 32]),
            vec![4, 16]
        );
    }

    #[test]
    fn test_duplicate_key_is_order_violation() {
        let mut join = merge_join(items(&[1, 2, 2, 3], 'l'), items(&[1, 2, 3], 'r'));
        assert!(matches!(join.next(), Some(Ok((Item(1, _), _)))));
        assert!(matches!(join.next(), Some(Ok((Item(2, _), _)))));
        assert_eq!(
            join.next(),
            Some(Err(TestError::Order(OrderViolation {
                side: Side::Left,
                previous: "2".to_string(),
                current: "2".to_string(),
            })))
        );
        assert_eq!(join.next(), None);
    }

    #[test]
    fn test_descending_right_is_order_violation() {
        let result: Result<Vec<_>, TestError> =
            merge_join(items(&[1, 5, 9], 'l'), items(&[1, 7, 3], 'r')).collect();
        match result {
            Err(TestError::Order(violation)) => {
                assert_eq!(violation.side, Side::Right);
                assert_eq!(
                    violation.to_string(),
                    "right input is not strictly ascending: key 3 follows 7"
                );
            }
            other => panic!("expected an order violation, got {other:?}"),
        }
    }

    #[test]
    fn test_source_error_ends_join() {
        let left = vec![Ok(Item(1, 'l')), Err(TestError::Source("boom")), Ok(Item(2, 'l'))];
        let mut join = merge_join(left, items(&[1, 2], 'r'));
        assert!(matches!(join.next(), Some(Ok(_))));
        assert_eq!(join.next(), Some(Err(TestError::Source("boom"))));
        assert_eq!(join.next(), None);
    }
}
