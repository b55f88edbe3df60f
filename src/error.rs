//! Allocation errors.

use core::{
	alloc::Layout,
	fmt
};
use std::error::Error;

/// Error returned when a storage block cannot be reserved.
///
/// This is the only failure a [`RawBlock`](crate::raw::RawBlock) can report.
/// Failures raised by the elements themselves are never wrapped in this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReserveError {
	/// The requested capacity exceeds the maximum size of an allocation.
	CapacityOverflow,

	/// The global allocator could not satisfy the request.
	AllocError {
		/// Layout of the rejected request.
		layout: Layout
	}
}

impl fmt::Display for ReserveError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::CapacityOverflow => {
				write!(f, "capacity overflow")
			},
			Self::AllocError { layout } => {
				write!(f, "out of memory: allocation of {} bytes (align {}) failed", layout.size(), layout.align())
			}
		}
	}
}

impl Error for ReserveError {}
