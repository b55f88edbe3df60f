use core::{
	alloc::Layout,
	marker::PhantomData,
	mem,
	ptr::NonNull
};
use std::alloc::{
	self,
	handle_alloc_error
};
use crate::ReserveError;

/// A low-level utility owning an uninitialized block of memory sized for `capacity` elements.
///
/// This type does not in anyway inspect the memory that it manages. When dropped it *will*
/// free its memory, but it *won't* try to drop its contents. It is up to the user of `RawBlock`
/// to handle the actual things *stored* inside of a `RawBlock`.
///
/// An empty block (capacity `0`) holds a dangling pointer and never touches the allocator.
/// Blocks of zero-sized elements never allocate either, but still remember their capacity.
pub struct RawBlock<T> {
	/// Start of the block (dangling if nothing is allocated).
	ptr: NonNull<T>,

	/// Number of slots in the block.
	capacity: usize,

	/// The block logically owns slots of `T`.
	marker: PhantomData<T>
}

unsafe impl<T: Send> Send for RawBlock<T> {}
unsafe impl<T: Sync> Sync for RawBlock<T> {}

impl<T> Drop for RawBlock<T> {
	fn drop(&mut self) {
		if let Some((ptr, layout)) = self.current_memory() {
			unsafe {
				alloc::dealloc(ptr.as_ptr(), layout)
			}
		}
	}
}

impl<T> Default for RawBlock<T> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<T> RawBlock<T> {
	/// Creates an empty block.
	///
	/// This does not allocate.
	#[inline]
	pub const fn new() -> Self {
		RawBlock {
			ptr: NonNull::dangling(),
			capacity: 0,
			marker: PhantomData
		}
	}

	/// Reserves an uninitialized block for `capacity` elements.
	///
	/// # Panics
	///
	/// Panics if the size of the block overflows `isize::MAX` bytes.
	/// Aborts through [`handle_alloc_error`] if the allocator fails.
	#[inline]
	pub fn allocate(capacity: usize) -> Self {
		handle_reserve(Self::try_allocate(capacity))
	}

	/// The same as `allocate`, but returns on errors instead of panicking or aborting.
	pub fn try_allocate(capacity: usize) -> Result<Self, ReserveError> {
		if capacity == 0 {
			return Ok(Self::new())
		}

		if mem::size_of::<T>() == 0 {
			return Ok(RawBlock {
				ptr: NonNull::dangling(),
				capacity,
				marker: PhantomData
			})
		}

		let layout = Layout::array::<T>(capacity).map_err(|_| ReserveError::CapacityOverflow)?;
		alloc_guard(layout.size())?;

		// SAFETY: `layout` has a non-zero size.
		let ptr = unsafe { alloc::alloc(layout) };
		match NonNull::new(ptr as *mut T) {
			Some(ptr) => Ok(RawBlock {
				ptr,
				capacity,
				marker: PhantomData
			}),
			None => Err(ReserveError::AllocError { layout })
		}
	}

	/// Returns the current allocated memory and layout.
	///
	/// Returns `None` if the block is empty or if the size of `T` is 0.
	fn current_memory(&self) -> Option<(NonNull<u8>, Layout)> {
		if self.capacity == 0 || mem::size_of::<T>() == 0 {
			None
		} else {
			// We have an allocated chunk of memory, so we can bypass runtime
			// checks to get our current layout.
			unsafe {
				let align = mem::align_of::<T>();
				let size = mem::size_of::<T>() * self.capacity;
				let layout = Layout::from_size_align_unchecked(size, align);
				Some((self.ptr.cast(), layout))
			}
		}
	}

	/// Number of element slots in the block.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Returns `true` if the block is the empty sentinel.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.capacity == 0
	}

	#[inline]
	pub fn as_ptr(&self) -> *const T {
		self.ptr.as_ptr()
	}

	#[inline]
	pub fn as_mut_ptr(&mut self) -> *mut T {
		self.ptr.as_ptr()
	}

	/// Address of the slot at `index`.
	///
	/// The one-past-the-end address (`index == capacity`) is allowed.
	/// No liveness check is made: the slot may or may not hold an element.
	#[inline]
	pub fn slot(&self, index: usize) -> *mut T {
		debug_assert!(index <= self.capacity, "slot index (is {}) should be <= capacity (is {})", index, self.capacity);
		self.ptr.as_ptr().wrapping_add(index)
	}

	/// Moves the block out, leaving an empty block in its place.
	#[inline]
	pub fn take(&mut self) -> Self {
		mem::replace(self, Self::new())
	}

	/// Exchanges the memory owned by `self` and `other`.
	#[inline]
	pub fn swap(&mut self, other: &mut Self) {
		mem::swap(self, other)
	}
}

// Central function for reserve error handling.
#[inline]
pub(crate) fn handle_reserve<R>(result: Result<R, ReserveError>) -> R {
	match result {
		Err(ReserveError::CapacityOverflow) => capacity_overflow(),
		Err(ReserveError::AllocError { layout }) => handle_alloc_error(layout),
		Ok(r) => r
	}
}

// We need to guarantee the following:
// * We don't ever allocate `> isize::MAX` byte-size objects.
// * We don't overflow `usize::MAX` and actually allocate too little.
//
// `Layout::array` already rejects sizes above `isize::MAX`, this only keeps
// 16 and 32-bit targets honest when that check changes.
#[inline]
fn alloc_guard(alloc_size: usize) -> Result<(), ReserveError> {
	if usize::BITS < 64 && alloc_size > isize::MAX as usize {
		Err(ReserveError::CapacityOverflow)
	} else {
		Ok(())
	}
}

// One central function responsible for reporting capacity overflows.
pub(crate) fn capacity_overflow() -> ! {
	panic!("capacity overflow");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_capacity_is_the_empty_sentinel() {
		let block: RawBlock<u32> = RawBlock::allocate(0);
		assert!(block.is_empty());
		assert_eq!(block.capacity(), 0);
		assert_eq!(block.as_ptr(), NonNull::<u32>::dangling().as_ptr() as *const u32);
	}

	#[test]
	fn allocated_slots_are_writable() {
		let mut block: RawBlock<u64> = RawBlock::allocate(4);
		assert_eq!(block.capacity(), 4);
		unsafe {
			for i in 0..4 {
				block.slot(i).write(i as u64 * 10);
			}
			assert_eq!(*block.slot(3), 30);
		}
		assert_eq!(block.slot(4), block.as_mut_ptr().wrapping_add(4));
	}

	#[test]
	fn take_leaves_an_empty_source() {
		let mut a: RawBlock<u8> = RawBlock::allocate(16);
		let ptr = a.as_ptr();
		let b = a.take();
		assert!(a.is_empty());
		assert_eq!(b.capacity(), 16);
		assert_eq!(b.as_ptr(), ptr);
	}

	#[test]
	fn swap_exchanges_address_and_capacity() {
		let mut a: RawBlock<u16> = RawBlock::allocate(2);
		let mut b: RawBlock<u16> = RawBlock::allocate(8);
		let (pa, pb) = (a.as_ptr(), b.as_ptr());
		a.swap(&mut b);
		assert_eq!(a.capacity(), 8);
		assert_eq!(b.capacity(), 2);
		assert_eq!(a.as_ptr(), pb);
		assert_eq!(b.as_ptr(), pa);
	}

	#[test]
	fn zero_sized_blocks_remember_capacity() {
		let block: RawBlock<()> = RawBlock::allocate(1000);
		assert_eq!(block.capacity(), 1000);
		assert!(!block.is_empty());
	}

	#[test]
	fn oversized_request_is_a_capacity_overflow() {
		let result = RawBlock::<u64>::try_allocate(usize::MAX);
		assert_eq!(result.err(), Some(ReserveError::CapacityOverflow));
	}

	#[test]
	#[should_panic(expected = "capacity overflow")]
	fn oversized_allocate_panics() {
		let _ = RawBlock::<u64>::allocate(usize::MAX / 2);
	}
}
