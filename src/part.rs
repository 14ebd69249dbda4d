//! The contract between the composition engine and the host's part objects.
//!
//! The engine never knows what a part object is. The host supplies a [`PartFactory`]
//! that turns a [`PartDefinition`] plus resolved constructor arguments into a boxed
//! [`Part`], and the engine only ever talks to that object through the trait:
//! evaluating exports, assigning property imports, and disposing of it.

use std::any::Any ;
use std::sync::{ Arc, Weak };
use parking_lot::{ RwLock, RwLockReadGuard, RwLockWriteGuard };

use crate::cardinality::ImportValue ;
use crate::definition::{ PartDefinition, ImportDefinition, ExportDefinition, ImportId };



/// A value produced by an export.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Error reported by host code: the factory, an export accessor or a property setter.
pub type PartError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A live object built by a [`PartFactory`].
///
/// # Example
///
/// ```
/// use std::any::Any ;
/// use std::sync::Arc ;
/// use part_link::{ Part, PartError, Value, ExportDefinition };
///
/// struct Clock { ticks: u64 }
///
/// impl Part for Clock {
///     fn export( &self, _: &ExportDefinition, _: &[Value] ) -> Result<Value, PartError> {
///         Ok( Arc::new( self.ticks ))
///     }
///     fn as_any( &self ) -> &dyn Any { self }
/// }
/// ```
pub trait Part: Send + Sync + 'static {

	/// Evaluates one of the part's exports.
	///
	/// For a method export `arguments` are the call arguments; property and type
	/// exports receive an empty slice.
	///
	/// # Errors
	/// Any host failure while producing the value.
	fn export( &self, export: &ExportDefinition, arguments: &[Value] ) -> Result<Value, PartError> ;

	/// Assigns a property import.
	///
	/// Called after construction for every property import, and again whenever the
	/// exports connected to it change. Absent imports are assigned an empty value.
	///
	/// # Errors
	/// Any host failure while assigning. The default implementation rejects every
	/// assignment, which suits parts without property imports.
	fn import( &mut self, import: &ImportDefinition, value: ImportValue ) -> Result<(), PartError> {
		let _ = value ;
		Err( format!( "Part does not accept property import '{}'", import.id() ).into() )
	}

	/// Releases the part's resources. Called once, before the object is dropped.
	fn dispose( &mut self ) {}

	/// Exposes the concrete object so the host can inspect it.
	fn as_any( &self ) -> &dyn Any ;
}

/// Resolved constructor imports, ordered by parameter position.
#[derive( Debug, Default )]
pub struct ConstructorArguments {
	arguments: Vec<( ImportId, ImportValue )>,
}

impl ConstructorArguments {

	pub(crate) fn new( arguments: Vec<( ImportId, ImportValue )> ) -> Self {
		Self { arguments }
	}

	/// The value resolved for the given constructor import.
	pub fn get( &self, import: &ImportId ) -> Option<&ImportValue> {
		self.arguments.iter()
			.find(|( id, _ )| id == import )
			.map(|( _, value )| value )
	}

	/// Removes and returns the value resolved for the given constructor import.
	pub fn take( &mut self, import: &ImportId ) -> Option<ImportValue> {
		let position = self.arguments.iter().position(|( id, _ )| id == import )?;
		Some( self.arguments.remove( position ).1 )
	}

	#[inline] pub fn len( &self ) -> usize { self.arguments.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.arguments.is_empty() }

	/// Arguments in parameter order.
	pub fn iter( &self ) -> impl Iterator<Item = &( ImportId, ImportValue )> { self.arguments.iter() }

	/// Argument values in parameter order.
	pub fn into_values( self ) -> impl Iterator<Item = ImportValue> {
		self.arguments.into_iter().map(|( _, value )| value )
	}
}

/// The host-supplied construction primitive.
///
/// Implemented for every `Fn( &PartDefinition, ConstructorArguments ) -> Result<Box<dyn Part>, PartError>`
/// closure, so a factory is usually just a closure that dispatches on
/// [`PartDefinition::id`].
pub trait PartFactory: Send + Sync {
	/// Builds a new object for `definition`.
	///
	/// # Errors
	/// Any host failure; the engine reports it as a construction failure of the
	/// instance being built.
	fn construct( &self, definition: &PartDefinition, arguments: ConstructorArguments ) -> Result<Box<dyn Part>, PartError> ;
}

impl<F> PartFactory for F
where
	F: Fn( &PartDefinition, ConstructorArguments ) -> Result<Box<dyn Part>, PartError> + Send + Sync,
{
	#[inline]
	fn construct( &self, definition: &PartDefinition, arguments: ConstructorArguments ) -> Result<Box<dyn Part>, PartError> {
		self( definition, arguments )
	}
}

/// Shared handle to a live part object.
///
/// Two handles are the same object exactly when [`PartHandle::ptr_eq`] holds; a
/// reconstructed instance always gets a new handle.
#[derive( Clone )]
pub struct PartHandle( Arc<RwLock<Box<dyn Part>>> );

impl PartHandle {

	pub(crate) fn new( part: Box<dyn Part> ) -> Self {
		Self( Arc::new( RwLock::new( part )))
	}

	/// Locks the object for reading.
	#[inline] pub fn read( &self ) -> RwLockReadGuard<'_, Box<dyn Part>> { self.0.read() }

	/// Locks the object for writing.
	#[inline] pub fn write( &self ) -> RwLockWriteGuard<'_, Box<dyn Part>> { self.0.write() }

	/// Whether both handles refer to the same object.
	#[inline] pub fn ptr_eq( &self, other: &Self ) -> bool { Arc::ptr_eq( &self.0, &other.0 ) }

	/// Runs `inspect` against the concrete object if it is a `T`.
	pub fn with<T: Any, R>( &self, inspect: impl FnOnce( &T ) -> R ) -> Option<R> {
		let guard = self.0.read();
		guard.as_any().downcast_ref::<T>().map( inspect )
	}

	pub(crate) fn downgrade( &self ) -> WeakPartHandle {
		WeakPartHandle( Arc::downgrade( &self.0 ))
	}
}

impl std::fmt::Debug for PartHandle {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_tuple( "PartHandle" ).field( &Arc::as_ptr( &self.0 )).finish()
	}
}

/// Non-owning reference to a live part object, held by deferred accessors so a
/// released object isn't kept alive by its importers.
#[derive( Clone )]
pub(crate) struct WeakPartHandle( Weak<RwLock<Box<dyn Part>>> );

impl WeakPartHandle {
	#[inline] pub(crate) fn upgrade( &self ) -> Option<PartHandle> { self.0.upgrade().map( PartHandle )}
}
