//! Search-based set intersection.

use std::cmp::Ordering;

use crate::visitor::Visitor;

/// For each element of `small`, gallops forward through `large` from the last
/// position found, then binary searches the final interval.
pub fn galloping<T, V>(small: &[T], large: &[T], visitor: &mut V)
where
    T: Ord + Copy,
    V: Visitor<T>,
{
    if small.is_empty() || large.is_empty() {
        return;
    }

    let mut base = 0;

    for &target in small {
        let mut offset = 1;

        while base + offset < large.len() &&
            large[base + offset] <= target
        {
            offset *= 2;
        }

        let lo = base + offset / 2;
        let hi = (large.len() - 1).min(base + offset);

        base = binary_search(large, target, lo, hi);

        if base >= large.len() {
            break;
        }
        if large[base] == target {
            visitor.visit(target);
        }
    }
}

/// Index of `target` in `set[lo..=hi]`, or of the first greater element.
pub fn binary_search<T>(
    set: &[T],
    target: T,
    lo: usize,
    hi: usize) -> usize
where
    T: Ord + Copy,
{
    let mut lower = lo as isize;
    let mut upper = hi as isize;

    while lower <= upper {
        let mid = lower + (upper - lower) / 2;
        let actual = set[mid as usize];

        match actual.cmp(&target) {
            Ordering::Less    => lower = mid + 1,
            Ordering::Greater => upper = mid - 1,
            Ordering::Equal   => return mid as usize,
        }
    }

    lower as usize
}

/// Suffix of `slice` starting at the first element for which `cmp` is not
/// `Less`. Steps forward exponentially, then halves the step back down.
pub fn gallop_by<T, F>(mut slice: &[T], mut cmp: F) -> &[T]
where
    F: FnMut(&T) -> Ordering,
{
    if slice.first().map_or(true, |x| cmp(x) != Ordering::Less) {
        return slice;
    }

    let mut step = 1;
    while step < slice.len() && cmp(&slice[step]) == Ordering::Less {
        slice = &slice[step..];
        step <<= 1;
    }

    step >>= 1;
    while step > 0 {
        if step < slice.len() && cmp(&slice[step]) == Ordering::Less {
            slice = &slice[step..];
        }
        step >>= 1;
    }

    // slice[0] is the last element still below the key
    &slice[1..]
}

/// Like [`gallop_by`], but also skips elements for which `cmp` is `Equal`.
pub fn gallop_gt_by<T, F>(slice: &[T], mut cmp: F) -> &[T]
where
    F: FnMut(&T) -> Ordering,
{
    let slice = gallop_by(slice, &mut cmp);
    let equal = slice.iter().take_while(|&x| cmp(x) == Ordering::Equal).count();
    &slice[equal..]
}

/// Suffix of `slice` from the first element `>= key`.
pub fn gallop<'a, T: Ord>(slice: &'a [T], key: &T) -> &'a [T] {
    gallop_by(slice, |x| x.cmp(key))
}

/// Suffix of `slice` from the first element `> key`.
pub fn gallop_gt<'a, T: Ord>(slice: &'a [T], key: &T) -> &'a [T] {
    gallop_gt_by(slice, |x| x.cmp(key))
}
