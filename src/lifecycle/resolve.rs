//! Turns connected exports into the values delivered to an importing part.

use std::sync::{ Arc, OnceLock };
use thiserror::Error ;
use tracing::debug ;

use crate::cardinality::{ ImportValue, Resolved };
use crate::definition::{ PartDefinition, ImportDefinition, ImportShape, ExportDefinition, ExportKind, MethodSignature };
use crate::part::{ ConstructorArguments, PartHandle, PartError, Value, WeakPartHandle };
use super::{ InstanceEngine, PartInstanceId, ImportConnection, ConstructionError };



/// Failures of deferred export access.
#[derive( Debug, Error )]
pub enum ExportError {
	#[error( "Provider instance {0} has been released" )]
	ProviderReleased( PartInstanceId ),
	#[error( "Expected {expected} arguments, found {found}" )]
	ArgumentCount { expected: usize, found: usize },
	#[error( "Export failed: {0}" )]
	Part( PartError ),
}

struct ExportAccess {
	provider: PartInstanceId,
	handle: WeakPartHandle,
	export: ExportDefinition,
}

impl ExportAccess {

	fn new( provider: PartInstanceId, handle: &PartHandle, export: &ExportDefinition ) -> Self {
		Self { provider, handle: handle.downgrade(), export: export.clone() }
	}

	fn evaluate( &self, arguments: &[Value] ) -> Result<Value, ExportError> {
		let handle = self.handle.upgrade().ok_or( ExportError::ProviderReleased( self.provider ))?;
		let part = handle.read();
		part.export( &self.export, arguments ).map_err( ExportError::Part )
	}
}

impl std::fmt::Debug for ExportAccess {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExportAccess" )
			.field( "provider", &self.provider )
			.field( "export", self.export.id() )
			.finish()
	}
}

/// Deferred access to an export: evaluated on first use, then cached.
///
/// Clones share the cache.
#[derive( Clone, Debug )]
pub struct LazyExport( Arc<( ExportAccess, OnceLock<Value> )> );

impl LazyExport {

	fn new( access: ExportAccess ) -> Self { Self( Arc::new(( access, OnceLock::new() ))) }

	/// The export's value, evaluating it if this is the first call.
	///
	/// # Errors
	/// Fails if the provider has been released or the export fails. A failed evaluation
	/// isn't cached.
	pub fn get( &self ) -> Result<Value, ExportError> {
		let ( access, cache ) = &*self.0 ;
		if let Some( value ) = cache.get() { return Ok( Arc::clone( value )) }
		let value = access.evaluate( &[] )?;
		Ok( Arc::clone( cache.get_or_init(|| value )))
	}

	/// Whether the value has been evaluated yet.
	#[inline]
	pub fn is_evaluated( &self ) -> bool {
		let ( _, cache ) = &*self.0 ;
		cache.get().is_some()
	}

	#[inline]
	pub fn provider( &self ) -> PartInstanceId {
		let ( access, _ ) = &*self.0 ;
		access.provider
	}
}

/// Repeatable access to an export: evaluated anew on every call.
#[derive( Clone, Debug )]
pub struct ExportFactory( Arc<ExportAccess> );

impl ExportFactory {

	/// Evaluates the export.
	///
	/// # Errors
	/// Fails if the provider has been released or the export fails.
	pub fn create( &self ) -> Result<Value, ExportError> { self.0.evaluate( &[] ) }

	#[inline] pub fn provider( &self ) -> PartInstanceId { self.0.provider }
}

/// An exported method bound to its provider.
#[derive( Clone, Debug )]
pub struct BoundMethod {
	access: Arc<ExportAccess>,
	signature: MethodSignature,
}

impl BoundMethod {

	/// Calls the method.
	///
	/// # Errors
	/// Fails if the argument count doesn't match the signature, the provider has been
	/// released, or the method fails.
	pub fn call( &self, arguments: &[Value] ) -> Result<Value, ExportError> {
		let expected = self.signature.parameters().len();
		if arguments.len() != expected {
			return Err( ExportError::ArgumentCount { expected, found: arguments.len() })
		}
		self.access.evaluate( arguments )
	}

	#[inline] pub fn signature( &self ) -> &MethodSignature { &self.signature }
	#[inline] pub fn provider( &self ) -> PartInstanceId { self.access.provider }
}

impl InstanceEngine {

	/// Resolves every constructor import in parameter order.
	pub(super) fn constructor_arguments(
		&self,
		definition: &PartDefinition,
		connections: &[ImportConnection],
	) -> Result<ConstructorArguments, ConstructionError> {
		definition.constructor_imports().into_iter()
			.map(| import | self.resolve_import( import, connections ).map(| value | ( import.id().clone(), value )))
			.collect::<Result<Vec<_>, ConstructionError>>()
			.map( ConstructorArguments::new )
	}

	/// Resolves the exports connected to `import`, shaped as the import expects.
	///
	/// Providers without a live object are skipped for optional imports and fail a
	/// prerequisite one.
	pub(super) fn resolve_import(
		&self,
		import: &ImportDefinition,
		connections: &[ImportConnection],
	) -> Result<ImportValue, ConstructionError> {

		let mut sources = Vec::new();
		for connection in connections.iter().filter(| connection | connection.import == *import.id() ) {
			let Some( record ) = self.instances.get( &connection.provider ) else { continue };
			let Some( export ) = record.definition.export( &connection.export ) else { continue };
			match &record.object {
				Some( handle ) => sources.push(( connection.provider, handle, export )),
				None if import.is_prerequisite() => return Err( ConstructionError::ProviderNotLive {
					import: import.id().clone(),
					provider: connection.provider,
				}),
				None => debug!( import = %import.id(), provider = %connection.provider, "skipping provider without a live object" ),
			}
		}

		if !import.cardinality().admits( sources.len() ) {
			return Err( ConstructionError::CardinalityViolation {
				import: import.id().clone(),
				cardinality: import.cardinality(),
				found: sources.len(),
			})
		}

		let resolved = sources.into_iter()
			.map(|( provider, handle, export )| resolve_export( import, provider, handle, export ))
			.collect::<Result<Vec<_>, _>>()?;
		Ok( ImportValue::collect( import.cardinality(), resolved ))

	}
}

fn resolve_export(
	import: &ImportDefinition,
	provider: PartInstanceId,
	handle: &PartHandle,
	export: &ExportDefinition,
) -> Result<Resolved, ConstructionError> {
	match ( import.shape(), export.kind() ) {
		( ImportShape::Lazy, _ ) => Ok( Resolved::Lazy( LazyExport::new( ExportAccess::new( provider, handle, export )))),
		( ImportShape::Factory, _ ) => Ok( Resolved::Factory( ExportFactory( Arc::new( ExportAccess::new( provider, handle, export ))))),
		( ImportShape::Delegate( expected ), ExportKind::Method( found )) => match expected == found {
			true => Ok( Resolved::Delegate( BoundMethod {
				access: Arc::new( ExportAccess::new( provider, handle, export )),
				signature: found.clone(),
			})),
			false => Err( ConstructionError::SignatureMismatch {
				import: import.id().clone(),
				expected: expected.clone(),
				found: found.clone(),
			}),
		},
		_ => handle.read()
			.export( export, &[] )
			.map( Resolved::Value )
			.map_err(| source | ConstructionError::Export { import: import.id().clone(), source }),
	}
}
