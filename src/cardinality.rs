//! Import cardinality and the container that delivers resolved exports to a part.
//!
//! An [`ImportValue`] holds whatever was resolved for one import, in a shape that
//! matches the import's [`Cardinality`]. Parts receive it as constructor arguments
//! and through property assignment.

use std::any::Any ;

use crate::part::Value ;
use crate::lifecycle::{ LazyExport, ExportFactory, BoundMethod };



/// Specifies how many exports may be connected to an import.
///
/// - `ExactlyOne`: the import expects a single export. Resolves to [`ImportValue::One`].
///
/// - `ZeroOrOne`: the import can work with or without an export. Resolves to
///   [`ImportValue::One`] or [`ImportValue::Unset`].
///
/// - `Many`: the import is collection-valued. Resolves to [`ImportValue::Many`], in
///   connection order, possibly empty.
///
/// Whether an absent export prevents the part from existing is decided separately by
/// the import's prerequisite flag.
#[derive( Debug, PartialEq, Eq, Hash, Copy, Clone )]
pub enum Cardinality {
	/// Exactly one export expected.
	ExactlyOne,
	/// Zero or one export allowed.
	ZeroOrOne,
	/// Any number of exports, delivered as a collection.
	Many,
}

impl Cardinality {
	/// Whether `count` connections are allowed by this cardinality.
	#[inline]
	pub fn admits( self, count: usize ) -> bool {
		match self {
			Self::ExactlyOne | Self::ZeroOrOne => count <= 1,
			Self::Many => true,
		}
	}
}

impl std::fmt::Display for Cardinality {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{:?}", self )}
}

/// A single resolved export, shaped according to the import's [`ImportShape`].
///
/// [`ImportShape`]: crate::ImportShape
#[derive( Clone )]
pub enum Resolved {
	/// The exported value, evaluated eagerly.
	Value( Value ),
	/// Deferred, cached access to the export.
	Lazy( LazyExport ),
	/// Repeatable access to the export.
	Factory( ExportFactory ),
	/// An exported method bound as a callable.
	Delegate( BoundMethod ),
}

impl Resolved {
	/// The eagerly evaluated value, if this is [`Resolved::Value`].
	#[inline]
	pub fn value( &self ) -> Option<&Value> {
		match self {
			Self::Value( value ) => Some( value ),
			_ => None,
		}
	}

	/// Downcasts an eagerly evaluated value.
	#[inline]
	pub fn downcast_ref<T: Any>( &self ) -> Option<&T> {
		self.value().and_then(| value | value.downcast_ref::<T>() )
	}
}

impl std::fmt::Debug for Resolved {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		match self {
			Self::Value( _ ) => f.debug_tuple( "Value" ).field( &"<value>" ).finish(),
			Self::Lazy( lazy ) => f.debug_tuple( "Lazy" ).field( lazy ).finish(),
			Self::Factory( factory ) => f.debug_tuple( "Factory" ).field( factory ).finish(),
			Self::Delegate( method ) => f.debug_tuple( "Delegate" ).field( method ).finish(),
		}
	}
}

/// Container for the exports resolved for one import.
///
/// | Cardinality | Connections | Variant |
/// |-------------|-------------|---------|
/// | `ExactlyOne` / `ZeroOrOne` | 0 | `Unset` |
/// | `ExactlyOne` / `ZeroOrOne` | 1 | `One(T)` |
/// | `Many` | n | `Many(Vec<T>)`, in connection order |
///
/// `Unset` and an empty `Many` are what an absent optional import is reset to.
#[derive( Debug, Clone )]
pub enum ImportValue<T = Resolved> {
	/// No export connected to a singular import.
	Unset,
	/// The single export connected to a singular import.
	One( T ),
	/// Every export connected to a collection import.
	Many( Vec<T> ),
}

impl<T> ImportValue<T> {

	/// The empty value appropriate for the given cardinality.
	#[inline]
	pub fn empty( cardinality: Cardinality ) -> Self {
		match cardinality {
			Cardinality::ExactlyOne | Cardinality::ZeroOrOne => Self::Unset,
			Cardinality::Many => Self::Many( Vec::with_capacity( 0 )),
		}
	}

	/// Builds a value of the given cardinality from resolved items.
	///
	/// Callers check [`Cardinality::admits`] first; extra items for a singular
	/// cardinality are dropped.
	pub(crate) fn collect( cardinality: Cardinality, items: impl IntoIterator<Item = T> ) -> Self {
		match cardinality {
			Cardinality::Many => Self::Many( items.into_iter().collect() ),
			Cardinality::ExactlyOne | Cardinality::ZeroOrOne => match items.into_iter().next() {
				Some( item ) => Self::One( item ),
				None => Self::Unset,
			},
		}
	}

	/// Whether nothing is connected.
	#[inline]
	pub fn is_empty( &self ) -> bool {
		match self {
			Self::Unset => true,
			Self::One( _ ) => false,
			Self::Many( items ) => items.is_empty(),
		}
	}

	/// Number of resolved exports held.
	#[inline]
	pub fn len( &self ) -> usize {
		match self {
			Self::Unset => 0,
			Self::One( _ ) => 1,
			Self::Many( items ) => items.len(),
		}
	}

	/// The single item of a singular import.
	#[inline]
	pub fn one( &self ) -> Option<&T> {
		match self {
			Self::One( item ) => Some( item ),
			_ => None,
		}
	}

	/// Iterates the held items in order.
	pub fn iter( &self ) -> std::slice::Iter<'_, T> {
		match self {
			Self::Unset => [].iter(),
			Self::One( item ) => std::slice::from_ref( item ).iter(),
			Self::Many( items ) => items.iter(),
		}
	}
}
