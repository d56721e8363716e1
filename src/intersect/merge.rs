use std::cmp::Ordering;

use crate::visitor::Visitor;

/// Classic two-pointer merge.
pub fn scalar_merge<T, V>(set_a: &[T], set_b: &[T], visitor: &mut V)
where
    T: Ord + Copy,
    V: Visitor<T>,
{
    merge_from(set_a, set_b, (0, 0), visitor);
}

/// Merges `set_a[i_a..]` with `set_b[i_b..]` and returns the number of
/// matches visited. Finishes the tail of every block kernel.
#[inline]
pub fn merge_from<T, V>(
    set_a: &[T],
    set_b: &[T],
    (mut idx_a, mut idx_b): (usize, usize),
    visitor: &mut V) -> usize
where
    T: Ord + Copy,
    V: Visitor<T>,
{
    let mut count = 0;

    while idx_a < set_a.len() && idx_b < set_b.len() {
        let value_a = set_a[idx_a];
        let value_b = set_b[idx_b];

        match value_a.cmp(&value_b) {
            Ordering::Less => idx_a += 1,
            Ordering::Greater => idx_b += 1,
            Ordering::Equal => {
                visitor.visit(value_a);
                count += 1;
                idx_a += 1;
                idx_b += 1;
            }
        }
    }
    count
}
