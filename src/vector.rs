use core::{
	convert::Infallible,
	iter::FromIterator,
	hash::{
		Hash,
		Hasher
	},
	ops::{
		Deref,
		DerefMut
	},
	mem,
	ptr,
	slice,
	fmt,
	cmp
};
use crate::{
	raw::{
		self,
		RawBlock
	},
	ReserveError
};

/// Contiguous growable array type built on top of a [`RawBlock`].
///
/// The first `len` slots of the block hold live elements, the remaining
/// `capacity - len` slots are uninitialized.
///
/// Every operation documents what happens to the array if an element
/// constructor fails halfway through, either by panicking or, for the `try_`
/// variants, by returning an error:
///  - *strong guarantee*: the array is left exactly as it was before the call;
///  - *basic guarantee*: the array is left in a valid state that may differ
///    from the original one.
///
/// Relocating elements into a new block is a bitwise move and never fails,
/// so growing the array never runs user code on the existing elements.
///
/// # Examples
///
/// ```
/// # use grow_vec::Vector;
/// let mut v = Vector::new();
/// v.push_back(1);
/// v.push_back(2);
/// v.push_back(4);
/// v.insert(2, 3);
/// assert_eq!(v, [1, 2, 3, 4]);
/// assert_eq!(v.capacity(), 4);
/// ```
pub struct Vector<T> {
	/// Backing storage.
	block: RawBlock<T>,

	/// Number of live elements at the start of `block`.
	len: usize
}

impl<T> Drop for Vector<T> {
	fn drop(&mut self) {
		unsafe {
			// drop every element, the block frees the memory itself.
			ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.block.as_mut_ptr(), self.len))
		}
	}
}

impl<T> Default for Vector<T> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Vector<T> {
	/// Creates a new empty `Vector`.
	///
	/// The vector will not allocate until elements are pushed onto it.
	#[inline]
	pub const fn new() -> Self {
		Vector {
			block: RawBlock::new(),
			len: 0
		}
	}

	/// Creates a new empty `Vector` with room for exactly `capacity` elements.
	#[inline]
	pub fn with_capacity(capacity: usize) -> Self {
		Vector {
			block: RawBlock::allocate(capacity),
			len: 0
		}
	}

	/// Creates a `Vector` holding `len` default values.
	///
	/// The capacity is exactly `len`.
	/// If `T::default` panics, the values already built are dropped and nothing leaks.
	///
	/// ```
	/// # use grow_vec::Vector;
	/// let v: Vector<u32> = Vector::with_len(5);
	/// assert_eq!(v, [0, 0, 0, 0, 0]);
	/// ```
	#[inline]
	pub fn with_len(len: usize) -> Self where T: Default {
		let mut vec = Self::with_capacity(len);
		vec.resize(len);
		vec
	}

	/// Moves the content out of this vector, leaving it empty with no capacity.
	///
	/// ```
	/// # use grow_vec::Vector;
	/// let mut v1: Vector<_> = [1, 2, 3].into();
	/// let v2 = v1.take();
	/// assert_eq!(v2, [1, 2, 3]);
	/// assert_eq!(v1.len(), 0);
	/// assert_eq!(v1.capacity(), 0);
	/// ```
	#[inline]
	pub fn take(&mut self) -> Self {
		Vector {
			block: self.block.take(),
			len: mem::replace(&mut self.len, 0)
		}
	}

	/// Exchanges the content of two vectors.
	///
	/// No element is moved or copied.
	#[inline]
	pub fn swap_with(&mut self, other: &mut Self) {
		self.block.swap(&mut other.block);
		mem::swap(&mut self.len, &mut other.len);
	}

	/// Returns the number of elements in the vector.
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the number of elements the vector can hold without reallocating.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.block.capacity()
	}

	/// Returns a raw pointer to the vector's buffer.
	///
	/// The caller must ensure that the vector outlives the pointer this
	/// function returns, or else it will end up pointing to garbage.
	/// Modifying the vector may cause its buffer to be reallocated,
	/// which would also make any pointers to it invalid.
	#[inline]
	pub fn as_ptr(&self) -> *const T {
		self.block.as_ptr()
	}

	/// Returns an unsafe mutable pointer to the vector's buffer.
	#[inline]
	pub fn as_mut_ptr(&mut self) -> *mut T {
		self.block.as_mut_ptr()
	}

	/// Extracts a slice containing the entire vector.
	#[inline]
	pub fn as_slice(&self) -> &[T] {
		unsafe {
			slice::from_raw_parts(self.block.as_ptr(), self.len)
		}
	}

	/// Extracts a mutable slice of the entire vector.
	#[inline]
	pub fn as_mut_slice(&mut self) -> &mut [T] {
		unsafe {
			slice::from_raw_parts_mut(self.block.as_mut_ptr(), self.len)
		}
	}

	/// Reserves room for exactly `new_capacity` elements.
	///
	/// Does nothing if the capacity is already at least `new_capacity`.
	/// Otherwise every element is moved into a new block and the old block is released,
	/// invalidating any pointer into the vector.
	///
	/// # Panics
	///
	/// Panics if the new capacity overflows `isize::MAX` bytes.
	pub fn reserve(&mut self, new_capacity: usize) {
		raw::handle_reserve(self.try_reserve(new_capacity))
	}

	/// The same as `reserve`, but returns on errors instead of panicking or aborting.
	///
	/// On error the vector is unchanged.
	pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), ReserveError> {
		if new_capacity <= self.capacity() {
			return Ok(())
		}

		let mut new_block: RawBlock<T> = RawBlock::try_allocate(new_capacity)?;
		unsafe {
			self.relocate(0, self.len, &mut new_block, 0);
		}
		// the old block only holds moved-out slots now.
		self.block.swap(&mut new_block);
		Ok(())
	}

	/// Shortens the vector, keeping the first `len` elements and dropping the rest.
	///
	/// Has no effect if `len` is greater than the vector's current length.
	/// The capacity is left untouched.
	pub fn truncate(&mut self, len: usize) {
		if len < self.len {
			unsafe {
				let tail = ptr::slice_from_raw_parts_mut(self.block.slot(len), self.len - len);
				self.len = len;
				ptr::drop_in_place(tail);
			}
		}
	}

	/// Clears the vector, removing all values.
	///
	/// Note that this method has no effect on the allocated capacity
	/// of the vector.
	#[inline]
	pub fn clear(&mut self) {
		self.truncate(0)
	}

	/// Resizes the vector so that its length is `new_len`.
	///
	/// Trailing elements are dropped when shrinking,
	/// default values are appended when growing.
	/// If `T::default` panics, the vector keeps its original length and the
	/// values already built are dropped.
	#[inline]
	pub fn resize(&mut self, new_len: usize) where T: Default {
		self.resize_with(new_len, T::default)
	}

	/// Same as `resize` but new elements are produced by `f`.
	pub fn resize_with<F>(&mut self, new_len: usize, mut f: F) where F: FnMut() -> T {
		match self.try_resize_with(new_len, || Ok::<T, Infallible>(f())) {
			Ok(()) => (),
			Err(e) => match e {}
		}
	}

	/// Same as `resize_with` with a fallible constructor.
	///
	/// If `f` fails, the values already built for the new tail are dropped and
	/// the length is unchanged. The capacity may have grown.
	pub fn try_resize_with<F, E>(&mut self, new_len: usize, mut f: F) -> Result<(), E> where F: FnMut() -> Result<T, E> {
		if new_len <= self.len {
			self.truncate(new_len);
			return Ok(())
		}

		self.reserve(new_len);

		unsafe {
			let mut tail = PartialInit::new(self.block.slot(self.len));
			for _ in self.len..new_len {
				tail.push(f()?);
			}
			tail.finish();
		}

		self.len = new_len;
		Ok(())
	}

	/// Appends an element to the back of the vector.
	///
	/// Returns a reference to the new element.
	///
	/// When the vector is full its capacity is doubled (`0` grows to `1`).
	///
	/// # Panics
	///
	/// Panics if the new capacity overflows `isize::MAX` bytes.
	#[inline]
	pub fn push_back(&mut self, value: T) -> &mut T {
		self.emplace_back_with(move || value)
	}

	/// Appends the element returned by `f` to the back of the vector.
	///
	/// If a reallocation is needed, `f` is only called once the new block is reserved,
	/// and the existing elements are moved to the new block only once `f` returns.
	/// If `f` panics the vector is unchanged.
	#[inline]
	pub fn emplace_back_with<F>(&mut self, f: F) -> &mut T where F: FnOnce() -> T {
		match self.try_emplace_back_with(|| Ok::<T, Infallible>(f())) {
			Ok(value) => value,
			Err(e) => match e {}
		}
	}

	/// Same as `emplace_back_with` with a fallible constructor.
	///
	/// If `f` fails the error is returned and the vector is unchanged.
	///
	/// ```
	/// # use grow_vec::Vector;
	/// let mut v: Vector<u8> = Vector::new();
	/// v.push_back(1);
	/// assert!(v.try_emplace_back_with(|| "300".parse::<u8>()).is_err());
	/// assert_eq!(v, [1]);
	/// assert_eq!(v.capacity(), 1);
	/// ```
	pub fn try_emplace_back_with<F, E>(&mut self, f: F) -> Result<&mut T, E> where F: FnOnce() -> Result<T, E> {
		let index = self.len;
		self.emplace_at(index, f)?;
		unsafe {
			Ok(&mut *self.block.slot(index))
		}
	}

	/// Inserts an element at position `index` within the vector, shifting all
	/// elements after it to the right.
	///
	/// Returns `index`.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	#[inline]
	pub fn insert(&mut self, index: usize, element: T) -> usize {
		self.emplace_with(index, move || element)
	}

	/// Inserts the element returned by `f` at position `index`.
	///
	/// The element is built before any existing element is moved.
	/// If `f` panics the vector is unchanged.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	#[inline]
	pub fn emplace_with<F>(&mut self, index: usize, f: F) -> usize where F: FnOnce() -> T {
		match self.try_emplace_with(index, || Ok::<T, Infallible>(f())) {
			Ok(index) => index,
			Err(e) => match e {}
		}
	}

	/// Same as `emplace_with` with a fallible constructor.
	///
	/// If `f` fails the error is returned and the vector is unchanged.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	pub fn try_emplace_with<F, E>(&mut self, index: usize, f: F) -> Result<usize, E> where F: FnOnce() -> Result<T, E> {
		let len = self.len;
		if index > len {
			panic!("insertion index (is {}) should be <= len (is {})", index, len);
		}

		self.emplace_at(index, f)?;
		Ok(index)
	}

	/// Removes and returns the element at position `index` within the vector,
	/// shifting all elements after it to the left.
	///
	/// # Panics
	///
	/// Panics if `index` is out of bounds.
	pub fn remove(&mut self, index: usize) -> T {
		let len = self.len;
		if index >= len {
			panic!("removal index (is {}) should be < len (is {})", index, len);
		}

		unsafe {
			// infallible
			let ptr = self.block.slot(index);
			let ret = ptr::read(ptr);

			// Shift everything down to fill in that spot.
			ptr::copy(ptr.add(1), ptr, len - index - 1);
			self.len = len - 1;
			ret
		}
	}

	/// Drops the element at position `index`, shifting all elements after it to the left.
	///
	/// Returns `index`, which is now the position of the element that followed
	/// the erased one (or the end of the vector).
	///
	/// # Panics
	///
	/// Panics if `index` is out of bounds.
	#[inline]
	pub fn erase(&mut self, index: usize) -> usize {
		mem::drop(self.remove(index));
		index
	}

	/// Drops the last element.
	///
	/// # Panics
	///
	/// Panics if the vector is empty.
	pub fn pop_back(&mut self) {
		if self.len == 0 {
			panic!("pop_back on an empty vector");
		}

		self.len -= 1;
		unsafe {
			ptr::drop_in_place(self.block.slot(self.len))
		}
	}

	/// Removes the last element from a vector and returns it, or [`None`] if it
	/// is empty.
	#[inline]
	pub fn pop(&mut self) -> Option<T> {
		if self.len == 0 {
			None
		} else {
			unsafe {
				self.len -= 1;
				Some(ptr::read(self.block.slot(self.len)))
			}
		}
	}

	/// Capacity of the block allocated when a full vector grows.
	fn grown_capacity(&self) -> usize {
		match self.capacity() {
			0 => 1,
			capacity => match capacity.checked_mul(2) {
				Some(capacity) => capacity,
				None => raw::capacity_overflow()
			}
		}
	}

	/// Builds an element with `f` and places it at `index`.
	///
	/// When the vector is full, a new block is reserved and the element is built
	/// before touching the current block. The elements in front of `index` and
	/// behind it are then moved to the new block in two runs around the new element.
	fn emplace_at<F, E>(&mut self, index: usize, f: F) -> Result<(), E> where F: FnOnce() -> Result<T, E> {
		debug_assert!(index <= self.len);

		if self.len == self.capacity() {
			let mut new_block: RawBlock<T> = RawBlock::allocate(self.grown_capacity());

			// if this fails `new_block` is released and the vector is untouched.
			let value = f()?;

			unsafe {
				new_block.slot(index).write(value);
				self.relocate(0, index, &mut new_block, 0);
				self.relocate(index, self.len - index, &mut new_block, index + 1);
			}

			self.block.swap(&mut new_block);
		} else {
			let value = f()?;

			unsafe {
				let p = self.block.slot(index);
				// Shift everything over to make space. (Duplicating the
				// `index`th element into two consecutive places.)
				ptr::copy(p, p.add(1), self.len - index);
				// Write it in, overwriting the first copy of the `index`th
				// element.
				ptr::write(p, value);
			}
		}

		self.len += 1;
		Ok(())
	}

	/// Moves `count` elements starting at `from` into `dst` starting at slot `to`.
	///
	/// ## Safety
	///
	/// The source range must be live, the destination range uninitialized.
	/// The moved slots of `self` must be treated as uninitialized afterwards.
	#[inline]
	unsafe fn relocate(&self, from: usize, count: usize, dst: &mut RawBlock<T>, to: usize) {
		debug_assert!(from + count <= self.len);
		debug_assert!(to + count <= dst.capacity());
		ptr::copy_nonoverlapping(self.block.slot(from), dst.slot(to), count)
	}
}

impl<T: Clone> Vector<T> {
	/// Clones every element of `s` into a new vector with capacity `s.len()`.
	///
	/// If a clone panics, the clones already made are dropped.
	fn from_slice(s: &[T]) -> Self {
		let mut block: RawBlock<T> = RawBlock::allocate(s.len());

		unsafe {
			let mut init = PartialInit::new(block.as_mut_ptr());
			for item in s {
				init.push(item.clone());
			}
			init.finish();
		}

		Vector {
			block,
			len: s.len()
		}
	}
}

/// Tracks the elements written in a run of uninitialized slots.
///
/// If dropped before `finish` is called, the written elements are dropped.
struct PartialInit<T> {
	start: *mut T,
	initialized: usize
}

impl<T> PartialInit<T> {
	#[inline]
	fn new(start: *mut T) -> Self {
		PartialInit {
			start,
			initialized: 0
		}
	}

	/// ## Safety
	///
	/// The next slot must be valid for writes.
	#[inline]
	unsafe fn push(&mut self, value: T) {
		self.start.add(self.initialized).write(value);
		self.initialized += 1;
	}

	/// Keeps the written elements alive, returning how many there are.
	#[inline]
	fn finish(self) -> usize {
		let initialized = self.initialized;
		mem::forget(self);
		initialized
	}
}

impl<T> Drop for PartialInit<T> {
	fn drop(&mut self) {
		unsafe {
			ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.initialized))
		}
	}
}

impl<T: Clone> Clone for Vector<T> {
	/// Copies every element into a new vector whose capacity equals the length.
	///
	/// If an element clone panics, the partial copy is dropped and `self` is untouched.
	#[inline]
	fn clone(&self) -> Self {
		Self::from_slice(self)
	}

	/// Overwrites `self` with a copy of `source`.
	///
	/// If `source` does not fit in the current capacity, a full copy is built
	/// first then exchanged with `self`: a panicking clone leaves `self` unchanged.
	///
	/// Otherwise the elements are assigned in place with [`Clone::clone_from`],
	/// the extra elements of `self` are dropped or the missing ones cloned into
	/// the spare slots, and the length is updated last. A panicking clone then
	/// leaves `self` partially overwritten, still holding its old length.
	fn clone_from(&mut self, source: &Self) {
		if source.len > self.capacity() {
			let mut copy = source.clone();
			self.swap_with(&mut copy);
		} else {
			let common = cmp::min(self.len, source.len);
			for (dst, src) in self[..common].iter_mut().zip(&source[..common]) {
				dst.clone_from(src);
			}

			if source.len < self.len {
				self.truncate(source.len);
			} else {
				unsafe {
					let mut tail = PartialInit::new(self.block.slot(self.len));
					for item in &source[self.len..] {
						tail.push(item.clone());
					}
					tail.finish();
				}
				self.len = source.len;
			}
		}
	}
}

impl<T> Deref for Vector<T> {
	type Target = [T];

	#[inline]
	fn deref(&self) -> &[T] {
		self.as_slice()
	}
}

impl<T> DerefMut for Vector<T> {
	#[inline]
	fn deref_mut(&mut self) -> &mut [T] {
		self.as_mut_slice()
	}
}

impl<'v, T> IntoIterator for &'v Vector<T> {
	type Item = &'v T;
	type IntoIter = slice::Iter<'v, T>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<'v, T> IntoIterator for &'v mut Vector<T> {
	type Item = &'v mut T;
	type IntoIter = slice::IterMut<'v, T>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.iter_mut()
	}
}

/// Owning iterator over the elements of a [`Vector`].
///
/// Elements that are not yielded are dropped with the iterator.
pub struct IntoIter<T> {
	block: RawBlock<T>,
	start: usize,
	end: usize
}

impl<T> Iterator for IntoIter<T> {
	type Item = T;

	#[inline]
	fn next(&mut self) -> Option<T> {
		if self.start == self.end {
			None
		} else {
			unsafe {
				let item = ptr::read(self.block.slot(self.start));
				self.start += 1;
				Some(item)
			}
		}
	}

	#[inline]
	fn size_hint(&self) -> (usize, Option<usize>) {
		let len = self.end - self.start;
		(len, Some(len))
	}
}

impl<T> DoubleEndedIterator for IntoIter<T> {
	#[inline]
	fn next_back(&mut self) -> Option<T> {
		if self.start == self.end {
			None
		} else {
			unsafe {
				self.end -= 1;
				Some(ptr::read(self.block.slot(self.end)))
			}
		}
	}
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
	fn drop(&mut self) {
		unsafe {
			ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.block.slot(self.start), self.end - self.start))
		}
	}
}

impl<T> IntoIterator for Vector<T> {
	type Item = T;
	type IntoIter = IntoIter<T>;

	#[inline]
	fn into_iter(mut self) -> Self::IntoIter {
		// `self` is left empty, its drop is a no-op.
		let end = mem::replace(&mut self.len, 0);
		IntoIter {
			block: self.block.take(),
			start: 0,
			end
		}
	}
}

impl<T> Extend<T> for Vector<T> {
	#[inline]
	fn extend<I: IntoIterator<Item = T>>(&mut self, iterator: I) {
		for item in iterator {
			self.push_back(item);
		}
	}
}

impl<'a, T: Copy + 'a> Extend<&'a T> for Vector<T> {
	#[inline]
	fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iterator: I) {
		self.extend(iterator.into_iter().copied())
	}
}

impl<T> FromIterator<T> for Vector<T> {
	#[inline]
	fn from_iter<I: IntoIterator<Item = T>>(iterator: I) -> Self {
		let mut vec = Vector::new();
		vec.extend(iterator);
		vec
	}
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl<T: Hash> Hash for Vector<T> {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		Hash::hash(&**self, state)
	}
}

impl<T> AsRef<[T]> for Vector<T> {
	#[inline]
	fn as_ref(&self) -> &[T] {
		self
	}
}

impl<T> AsMut<[T]> for Vector<T> {
	#[inline]
	fn as_mut(&mut self) -> &mut [T] {
		self
	}
}

impl<'s, T: Clone> From<&'s [T]> for Vector<T> {
	#[inline]
	fn from(s: &'s [T]) -> Vector<T> {
		Self::from_slice(s)
	}
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
	fn from(array: [T; N]) -> Vector<T> {
		let mut vec = Vector::with_capacity(N);
		vec.extend(IntoIterator::into_iter(array));
		vec
	}
}

impl<T> From<Vec<T>> for Vector<T> {
	fn from(v: Vec<T>) -> Vector<T> {
		let mut vec = Vector::with_capacity(v.len());
		vec.extend(v);
		vec
	}
}

impl<T> From<Vector<T>> for Vec<T> {
	fn from(v: Vector<T>) -> Vec<T> {
		v.into_iter().collect()
	}
}

macro_rules! impl_slice_eq1 {
	([$($vars:tt)*] $lhs:ty, $rhs:ty $(where $ty:ty: $bound:ident)?) => {
		impl<$($vars)*> PartialEq<$rhs> for $lhs where T: PartialEq<U>, $($ty: $bound)? {
			#[inline]
			fn eq(&self, other: &$rhs) -> bool { self[..] == other[..] }
			#[inline]
			fn ne(&self, other: &$rhs) -> bool { self[..] != other[..] }
		}
	}
}

impl_slice_eq1! { [T, U] Vector<T>, Vector<U> }
impl_slice_eq1! { [T, U] Vector<T>, Vec<U> }
impl_slice_eq1! { [T, U] Vec<T>, Vector<U> }
impl_slice_eq1! { [T, U] Vector<T>, &[U] }
impl_slice_eq1! { [T, U] Vector<T>, &mut [U] }
impl_slice_eq1! { [T, U] &[T], Vector<U> }
impl_slice_eq1! { [T, U] &mut [T], Vector<U> }
impl_slice_eq1! { [T, U, const N: usize] Vector<T>, [U; N] }
impl_slice_eq1! { [T, U, const N: usize] Vector<T>, &[U; N] }
impl_slice_eq1! { [T, U, const N: usize] [T; N], Vector<U> }

impl<T: Eq> Eq for Vector<T> {}
