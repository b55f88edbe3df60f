//! This crate provides the [`Vector`] data structure,
//! a contiguous growable array built directly on raw memory.
//!
//! The crate is split in two layers.
//! [`RawBlock`](raw::RawBlock) owns an uninitialized block of memory and knows nothing about
//! which of its slots hold a value.
//! [`Vector`] owns exactly one block and decides when elements are built, moved and dropped in it.
//!
//! ## Basic usage
//!
//! ```rust
//! use grow_vec::Vector;
//!
//! let mut v = Vector::new();
//! v.push_back(1); // capacity 1
//! v.push_back(2); // capacity 2
//! v.push_back(3); // capacity 4
//! assert_eq!(v, [1, 2, 3]);
//! assert_eq!(v.capacity(), 4);
//!
//! v.remove(1);
//! assert_eq!(v, [1, 3]);
//! ```
//!
//! ## Failure guarantees
//!
//! Elements may fail while being built, either by panicking in `Clone::clone`,
//! `Default::default` or a constructor closure, or by returning an error from the
//! constructor given to one of the `try_` methods.
//! Growing operations build every new element in the new block before adopting it,
//! so a failure leaves the vector exactly as it was:
//! ```rust
//! # use grow_vec::Vector;
//! let mut v: Vector<u32> = [1, 2].into();
//! let result = v.try_emplace_back_with(|| Err("no value"));
//! assert_eq!(result, Err("no value"));
//! assert_eq!(v, [1, 2]);
//! assert_eq!(v.capacity(), 2);
//! ```
//! Assigning in place with [`Clone::clone_from`] only offers the basic guarantee:
//! the vector stays valid but may be partially overwritten.

pub mod raw;
pub mod vector;
mod error;

pub use error::ReserveError;
pub use vector::{
	Vector,
	IntoIter
};
