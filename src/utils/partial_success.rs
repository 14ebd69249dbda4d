//! Type aliases for operations that support partial success/failure patterns.
//! These represent graceful error handling where some parts of an operation may fail
//! while others succeed, allowing partial completion rather than total failure.

use nonempty_collections::NEVec ;

/// Represents a successful operation where some parts failed but didn't prevent overall success.
/// The `Vec<E>` contains errors from the failed parts that were handled gracefully.
pub type PartialSuccess<T, E> = ( T, Vec<E> );

/// Represents an operation that may partially succeed or fail.
/// Ok: Core success data plus errors from partial failures that allowed completion.
/// Err: Primary failure cause plus errors that likely contributed to the overall failure.
pub type PartialResult<T, E> = Result<( T, Vec<E> ), ( E, Vec<E> )>;

/// Appends to a collection by value, so accumulators can be threaded through folds.
pub trait Merge<T> {
	/// Appends a single item.
	fn merge( self, item: T ) -> Self ;
	/// Appends every item of `items`.
	fn merge_all( self, items: impl IntoIterator<Item = T> ) -> Self ;
}

impl<T> Merge<T> for Vec<T> {
	#[inline]
	fn merge( mut self, item: T ) -> Self {
		self.push( item );
		self
	}

	#[inline]
	fn merge_all( mut self, items: impl IntoIterator<Item = T> ) -> Self {
		self.extend( items );
		self
	}
}

/// Converts a `Vec` into a non-empty vector, returning `None` when it is empty.
pub fn non_empty<T>( items: impl IntoIterator<Item = T> ) -> Option<NEVec<T>> {
	let mut items = items.into_iter();
	let mut vec = NEVec::new( items.next()? );
	items.for_each(| item | vec.push( item ));
	Some( vec )
}
