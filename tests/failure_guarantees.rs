//! Checks what is left of a vector when element construction fails halfway.
//!
//! `Tracked` counts its live instances per thread, and can be armed to panic
//! on the n-th clone or default construction.

use std::{
	cell::Cell,
	panic::{
		self,
		AssertUnwindSafe
	}
};
use grow_vec::Vector;

thread_local! {
	static LIVE: Cell<isize> = Cell::new(0);
	static FUSE: Cell<Option<usize>> = Cell::new(None);
}

fn live() -> isize {
	LIVE.with(Cell::get)
}

/// Panics on the `n`-th construction from now on (`1` is the next one).
fn arm(n: usize) {
	FUSE.with(|f| f.set(Some(n)))
}

fn disarm() {
	FUSE.with(|f| f.set(None))
}

fn burn() {
	let blow = FUSE.with(|f| match f.get() {
		Some(1) => {
			f.set(None);
			true
		},
		Some(n) => {
			f.set(Some(n - 1));
			false
		},
		None => false
	});

	if blow {
		panic!("construction failed");
	}
}

#[derive(Debug, PartialEq)]
struct Tracked(i32);

impl Tracked {
	fn new(value: i32) -> Self {
		burn();
		LIVE.with(|l| l.set(l.get() + 1));
		Tracked(value)
	}
}

impl Clone for Tracked {
	fn clone(&self) -> Self {
		Tracked::new(self.0)
	}
}

impl Default for Tracked {
	fn default() -> Self {
		Tracked::new(-1)
	}
}

impl Drop for Tracked {
	fn drop(&mut self) {
		LIVE.with(|l| l.set(l.get() - 1));
	}
}

fn tracked(values: &[i32]) -> Vector<Tracked> {
	values.iter().map(|&x| Tracked::new(x)).collect()
}

fn values(v: &Vector<Tracked>) -> Vec<i32> {
	v.iter().map(|t| t.0).collect()
}

fn fails<F: FnOnce()>(f: F) -> bool {
	let result = panic::catch_unwind(AssertUnwindSafe(f));
	disarm();
	result.is_err()
}

#[test]
fn growing_append_with_panicking_constructor_is_a_no_op() {
	let mut v = tracked(&[1, 2, 3, 4]);
	assert_eq!(v.capacity(), 4);
	let ptr = v.as_ptr();

	arm(1);
	assert!(fails(|| {
		v.emplace_back_with(|| Tracked::new(5));
	}));

	assert_eq!(values(&v), [1, 2, 3, 4]);
	assert_eq!(v.capacity(), 4);
	assert_eq!(v.as_ptr(), ptr);
	assert_eq!(live(), 4);

	drop(v);
	assert_eq!(live(), 0);
}

#[test]
fn growing_append_with_failing_constructor_returns_the_error() {
	let mut v = tracked(&[1, 2]);
	let result = v.try_emplace_back_with(|| Err::<Tracked, _>("rejected")).map(|_| ());
	assert_eq!(result, Err("rejected"));
	assert_eq!(values(&v), [1, 2]);
	assert_eq!(v.capacity(), 2);
	assert_eq!(live(), 2);
}

#[test]
fn growing_insert_with_panicking_constructor_is_a_no_op() {
	let mut v = tracked(&[1, 2, 3, 4]);

	arm(1);
	assert!(fails(|| {
		v.emplace_with(1, || Tracked::new(9));
	}));

	assert_eq!(values(&v), [1, 2, 3, 4]);
	assert_eq!(v.capacity(), 4);
	assert_eq!(live(), 4);

	v.emplace_with(1, || Tracked::new(9));
	assert_eq!(values(&v), [1, 9, 2, 3, 4]);
	assert_eq!(v.capacity(), 8);
	assert_eq!(live(), 5);
}

#[test]
fn in_place_insert_with_failing_constructor_is_a_no_op() {
	let mut v = tracked(&[1, 2, 3]);
	assert_eq!(v.capacity(), 4);
	assert_eq!(v.try_emplace_with(0, || Err::<Tracked, _>(())), Err(()));
	assert_eq!(values(&v), [1, 2, 3]);
	assert_eq!(live(), 3);
}

#[test]
fn copy_construction_failure_leaks_nothing() {
	let v = tracked(&[1, 2, 3, 4, 5]);

	arm(3);
	assert!(fails(|| {
		let _copy = v.clone();
	}));

	assert_eq!(values(&v), [1, 2, 3, 4, 5]);
	assert_eq!(live(), 5);
}

#[test]
fn reallocating_assignment_failure_leaves_target_unchanged() {
	let mut dst = tracked(&[7]);
	let src = tracked(&[1, 2, 3]);
	assert!(src.len() > dst.capacity());

	arm(2);
	assert!(fails(|| dst.clone_from(&src)));

	assert_eq!(values(&dst), [7]);
	assert_eq!(dst.capacity(), 1);
	assert_eq!(live(), 4);
}

#[test]
fn in_place_assignment_failure_keeps_old_length() {
	let mut dst = tracked(&[7, 8]);
	dst.reserve(8);
	let src = tracked(&[1, 2, 3, 4, 5]);
	assert_eq!(live(), 7);

	// two clones assign the common prefix, one builds the first tail
	// element, the fourth panics.
	arm(4);
	assert!(fails(|| dst.clone_from(&src)));

	// partially overwritten, length not updated, tail clone dropped.
	assert_eq!(dst.len(), 2);
	assert_eq!(values(&dst), [1, 2]);
	assert_eq!(dst.capacity(), 8);
	assert_eq!(live(), 7);

	dst.clone_from(&src);
	assert_eq!(values(&dst), [1, 2, 3, 4, 5]);
	assert_eq!(live(), 10);
}

#[test]
fn in_place_assignment_to_a_shorter_source_drops_the_tail() {
	let mut dst = tracked(&[1, 2, 3, 4]);
	let src = tracked(&[9]);
	dst.clone_from(&src);
	assert_eq!(values(&dst), [9]);
	assert_eq!(dst.capacity(), 4);
	assert_eq!(live(), 2);
}

#[test]
fn resize_growth_failure_keeps_length_and_leaks_nothing() {
	let mut v = tracked(&[1, 2]);

	arm(3);
	assert!(fails(|| v.resize(6)));

	assert_eq!(values(&v), [1, 2]);
	assert_eq!(live(), 2);

	let mut produced = 0;
	let result = v.try_resize_with(5, || {
		produced += 1;
		if produced == 3 {
			Err("third")
		} else {
			Ok(Tracked::new(0))
		}
	});
	assert_eq!(result, Err("third"));
	assert_eq!(values(&v), [1, 2]);
	assert_eq!(live(), 2);

	v.resize(4);
	assert_eq!(values(&v), [1, 2, -1, -1]);
	assert_eq!(live(), 4);
}

#[test]
fn resize_shrink_drops_exactly_the_tail() {
	let mut v = tracked(&[1, 2, 3, 4, 5]);
	v.resize(2);
	assert_eq!(values(&v), [1, 2]);
	assert_eq!(live(), 2);
}

#[test]
fn removal_drops_exactly_one_element() {
	let mut v = tracked(&[1, 2, 3, 4]);
	v.erase(1);
	assert_eq!(live(), 3);
	v.pop_back();
	assert_eq!(live(), 2);
	let removed = v.remove(0);
	assert_eq!(live(), 2);
	drop(removed);
	assert_eq!(live(), 1);
	assert_eq!(values(&v), [3]);
}

#[test]
fn partially_consumed_into_iter_drops_the_rest() {
	let v = tracked(&[1, 2, 3, 4, 5]);
	let mut it = v.into_iter();
	let first = it.next();
	let last = it.next_back();
	assert_eq!(live(), 5);
	drop(it);
	assert_eq!(live(), 2);
	drop((first, last));
	assert_eq!(live(), 0);
}

#[test]
fn moves_never_run_element_code() {
	let mut v = tracked(&[1, 2, 3]);
	let four = Tracked::new(4);
	let zero = Tracked::new(0);

	// any clone or default construction would panic now.
	arm(1);
	let mut w = v.take();
	w.reserve(64);
	w.push_back(four);
	w.insert(0, zero);
	v.swap_with(&mut w);
	disarm();

	assert_eq!(values(&v), [0, 1, 2, 3, 4]);
	assert!(w.is_empty());
	assert_eq!(live(), 5);
}
