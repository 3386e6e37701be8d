//! Index-based external quicksort.
//!
//! The data being sorted is never seen directly: it is reached only through
//! a three-way comparator over positions and a `swap(i, j)` callback. This
//! lets the same routine sort array elements, rows of a matrix, or several
//! parallel buffers at once.
//!
//! The partition is three-way (Dutch flag). Elements equal to the pivot are
//! parked at both ends of the active region while partitioning, and moved
//! next to the pivot once afterwards. The pivot is addressed by position, so
//! its position is updated whenever a swap moves it.

use std::cmp::Ordering;

use crate::{Result, StridedError};

/// Ranges shorter than this are insertion sorted.
const INSERTION_THRESHOLD: usize = 7;

/// Ranges longer than this use a median of nine as pivot.
const NINTHER_THRESHOLD: usize = 40;

/// Sort positions `[start, end)` of a sequence of length `len`.
///
/// # Errors
/// [`StridedError::Argument`] when `start > end`,
/// [`StridedError::IndexOutOfRange`] when `end > len`.
pub fn quick_sort<C, S>(len: usize, start: usize, end: usize, mut cmp: C, mut swap: S) -> Result<()>
where
    C: FnMut(usize, usize) -> Ordering,
    S: FnMut(usize, usize),
{
    if start > end {
        return Err(StridedError::argument(format!(
            "start index {start} is greater than end index {end}"
        )));
    }
    if end > len {
        return Err(StridedError::IndexOutOfRange { index: end, len });
    }
    quick_sort0(start, end, &mut cmp, &mut swap);
    Ok(())
}

/// Sort all positions `[0, len)`.
pub fn sort_indexed<C, S>(len: usize, mut cmp: C, mut swap: S)
where
    C: FnMut(usize, usize) -> Ordering,
    S: FnMut(usize, usize),
{
    quick_sort0(0, len, &mut cmp, &mut swap);
}

/// Position holding the median of the three given positions.
fn med3<C>(a: usize, b: usize, c: usize, cmp: &mut C) -> usize
where
    C: FnMut(usize, usize) -> Ordering,
{
    let ab = cmp(a, b);
    let ac = cmp(a, c);
    let bc = cmp(b, c);
    if ab == Ordering::Less {
        if bc == Ordering::Less {
            b
        } else if ac == Ordering::Less {
            c
        } else {
            a
        }
    } else if bc == Ordering::Greater {
        b
    } else if ac == Ordering::Greater {
        c
    } else {
        a
    }
}

fn quick_sort0<C, S>(start: usize, end: usize, cmp: &mut C, swap: &mut S)
where
    C: FnMut(usize, usize) -> Ordering,
    S: FnMut(usize, usize),
{
    let length = end - start;
    if length < INSERTION_THRESHOLD {
        insertion_sort(start, end, cmp, swap);
        return;
    }

    let mut middle = (start + end) / 2;
    if length > INSERTION_THRESHOLD {
        let mut bottom = start;
        let mut top = end - 1;
        if length > NINTHER_THRESHOLD {
            let skosh = length / 8;
            bottom = med3(bottom, bottom + skosh, bottom + 2 * skosh, cmp);
            middle = med3(middle - skosh, middle, middle + skosh, cmp);
            top = med3(top - 2 * skosh, top - skosh, top, cmp);
        }
        middle = med3(bottom, middle, top, cmp);
    }

    // Signed cursors: `c` and `d` may step just below `start`.
    let mut pivot = middle as isize;
    let mut a = start as isize;
    let mut b = a;
    let mut c = end as isize - 1;
    let mut d = c;

    while b <= c {
        // [start, a) holds pivot-equal values, [a, b) smaller ones
        while b <= c {
            let ord = cmp(b as usize, pivot as usize);
            if ord == Ordering::Greater {
                break;
            }
            if ord == Ordering::Equal {
                if a == pivot {
                    pivot = b;
                } else if b == pivot {
                    pivot = a;
                }
                swap(a as usize, b as usize);
                a += 1;
            }
            b += 1;
        }

        // (d, end) holds pivot-equal values, (c, d] larger ones
        while c >= b {
            let ord = cmp(c as usize, pivot as usize);
            if ord == Ordering::Less {
                break;
            }
            if ord == Ordering::Equal {
                if c == pivot {
                    pivot = d;
                } else if d == pivot {
                    pivot = c;
                }
                swap(c as usize, d as usize);
                d -= 1;
            }
            c -= 1;
        }

        if b <= c {
            if c == pivot {
                pivot = b;
            } else if b == pivot {
                pivot = c;
            }
            swap(b as usize, c as usize);
            b += 1;
            c -= 1;
        }
    }

    let start_i = start as isize;
    let end_i = end as isize;

    // Move the smaller-than-pivot block [a, b) to the front
    let n = (a - start_i).min(b - a);
    for k in 0..n {
        swap((start_i + k) as usize, (b - n + k) as usize);
    }

    // Move the larger-than-pivot block (c, d] to the back
    let n = (d - c).min(end_i - 1 - d);
    for k in 0..n {
        swap((b + k) as usize, (end_i - n + k) as usize);
    }

    let smaller = (b - a) as usize;
    if smaller > 0 {
        quick_sort0(start, start + smaller, cmp, swap);
    }
    let larger = (d - c) as usize;
    if larger > 0 {
        quick_sort0(end - larger, end, cmp, swap);
    }
}

fn insertion_sort<C, S>(start: usize, end: usize, cmp: &mut C, swap: &mut S)
where
    C: FnMut(usize, usize) -> Ordering,
    S: FnMut(usize, usize),
{
    for i in start + 1..end {
        let mut j = i;
        while j > start && cmp(j - 1, j) == Ordering::Greater {
            swap(j - 1, j);
            j -= 1;
        }
    }
}
