use std::collections::HashSet;
use std::hash::Hash;

use anyhow::anyhow;

use super::super::{RepositoryError, Result as RepoResult, SetOp};

pub fn find_mut<T, P>(v: &mut [T], preficate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let mut res = v.iter_mut().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn find_ref<T, P>(v: &[T], preficate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let mut res = v.iter().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

fn find_index<T, P>(v: &[T], mut preficate: P) -> RepoResult<usize>
where P: FnMut(&T) -> bool {
    let mut res = v
        .iter()
        .enumerate()
        .filter(|(_, t)| preficate(*t))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

/// Borrows two distinct elements at once. Both must resolve before either
/// reference is handed out.
pub fn find_pair_mut<T, K, F>(v: &mut [T], key: F, a: K, b: K) -> RepoResult<(&mut T, &mut T)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let i = find_index(v, |t| key(t) == a)?;
    let j = find_index(v, |t| key(t) == b)?;

    if i == j {
        return Err(RepositoryError::Internal(anyhow!(
            "expected two distinct objects, found one"
        )));
    }

    let (lo, hi) = (i.min(j), i.max(j));
    let (left, right) = v.split_at_mut(hi);
    let (x, y) = (&mut left[lo], &mut right[0]);

    match i < j {
        true => Ok((x, y)),
        false => Ok((y, x)),
    }
}

pub fn modify_set<T>(set: &mut HashSet<T>, target: T, op: SetOp) -> bool
where T: Eq + Hash {
    match op {
        SetOp::Add => set.insert(target),
        SetOp::Remove => set.remove(&target),
    }
}

#[test]
fn pair_is_returned_in_argument_order() {
    let mut v = vec![1, 2, 3, 4];

    let (a, b) = find_pair_mut(&mut v, |n| *n, 4, 2).unwrap();
    assert_eq!((*a, *b), (4, 2));
    *a += 10;
    *b += 10;
    assert_eq!(v, vec![1, 12, 3, 14]);

    assert!(matches!(
        find_pair_mut(&mut v, |n| *n, 1, 99),
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        find_pair_mut(&mut v, |n| *n, 1, 1),
        Err(RepositoryError::Internal(_))
    ));
}
