//! Part instance lifecycle.
//!
//! The [`InstanceEngine`] owns every part instance and the graph of connections
//! between them. It decides when an instance's object has to be built, rebuilt,
//! reassigned or destroyed, and carries those decisions through to every dependent:
//!
//! - **construct**: resolve the constructor imports, call the host factory, then assign
//!   every property import
//! - **update**: a changed property import is reassigned on the existing object, a
//!   changed constructor import rebuilds it, and a rebuild is pushed to every dependent
//!   once, in dependency order
//! - **remove**: dependents that lose a prerequisite are removed too; the others are
//!   updated with what remains connected
//!
//! Every operation reports the instances it touched as [`InstanceUpdate`] records,
//! dependents before the instance that caused them.

mod resolve ;
mod update ;
mod remove ;

use std::collections::{ HashMap, HashSet };
use std::sync::Arc ;
use nonempty_collections::NEVec ;
use thiserror::Error ;
use uuid::Uuid ;

use crate::cardinality::Cardinality ;
use crate::definition::{ PartDefinition, PartTypeId, ImportId, ExportId, MethodSignature };
use crate::graph::{ Connection, ConnectionGraph, GraphError };
use crate::part::{ PartFactory, PartHandle, PartError };
use crate::satisfaction::{ self, DependencyView };
use crate::utils::{ PartialResult, non_empty };
use update::UpdateRequest ;

pub use resolve::{ LazyExport, ExportFactory, BoundMethod, ExportError };



/// Unique identity of a part instance.
#[derive( Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd )]
pub struct PartInstanceId( Uuid );

impl PartInstanceId {
	pub(crate) fn mint() -> Self { Self( Uuid::new_v4() ) }
	#[inline] pub fn as_uuid( &self ) -> &Uuid { &self.0 }
}

impl std::fmt::Display for PartInstanceId {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.0 )}
}

/// One import of an instance satisfied by one export of a provider instance.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct ImportConnection {
	pub import: ImportId,
	pub provider: PartInstanceId,
	pub export: ExportId,
}

impl ImportConnection {
	pub fn new( import: impl Into<ImportId>, provider: PartInstanceId, export: impl Into<ExportId> ) -> Self {
		Self { import: import.into(), provider, export: export.into() }
	}
}

impl From<Connection<PartInstanceId, ImportId, ExportId>> for ImportConnection {
	fn from( connection: Connection<PartInstanceId, ImportId, ExportId> ) -> Self {
		Self { import: connection.import, provider: connection.exporter, export: connection.export }
	}
}

/// What happened to an instance during an operation.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum InstanceChange {
	/// The instance and its object are gone.
	Removed,
	/// The existing object had property imports reassigned.
	Updated,
	/// The instance has a newly built object.
	Reconstructed,
}

/// Record of a change to one instance.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub struct InstanceUpdate {
	pub instance: PartInstanceId,
	pub change: InstanceChange,
}

/// How a reconstruction cascade reacts to a failing dependent.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum FailurePolicy {
	/// Record the failure and keep updating the remaining dependents.
	#[default] BestEffort,
	/// Stop the cascade at the first failure. Dependents already processed keep their new state.
	HaltOnFirst,
}

/// Why an instance's object couldn't be built or updated.
#[derive( Debug, Error )]
pub enum ConstructionError {

	#[error( "Prerequisite imports without a live provider: {0:?}" )]
	MissingPrerequisites( NEVec<ImportId> ),

	#[error( "Prerequisite import '{import}' is connected to instance {provider}, which has no live object" )]
	ProviderNotLive { import: ImportId, provider: PartInstanceId },

	#[error( "Import '{import}' allows {cardinality} but {found} exports are connected" )]
	CardinalityViolation { import: ImportId, cardinality: Cardinality, found: usize },

	#[error( "Import '{import}' expects a delegate {expected:?} but the export has signature {found:?}" )]
	SignatureMismatch { import: ImportId, expected: MethodSignature, found: MethodSignature },

	#[error( "Failed to evaluate export for import '{import}': {source}" )]
	Export { import: ImportId, #[source] source: PartError },

	#[error( "Factory failed: {0}" )]
	Factory( #[source] PartError ),

	#[error( "Failed to assign import '{import}': {source}" )]
	Assignment { import: ImportId, #[source] source: PartError },

}

/// Errors raised by [`InstanceEngine`] operations.
#[derive( Debug, Error )]
pub enum ComposeError {

	#[error( "Unknown instance {0}" )]
	UnknownInstance( PartInstanceId ),

	#[error( "Part '{part}' has no import '{import}'" )]
	UnknownImport { part: PartTypeId, import: ImportId },

	#[error( "Part '{part}' has no export '{export}'" )]
	UnknownExport { part: PartTypeId, export: ExportId },

	#[error( "Instance {instance} could not be built: {cause}" )]
	ConstructionFailed { instance: PartInstanceId, #[source] cause: ConstructionError },

}

struct RegisteredDefinition {
	definition: Arc<PartDefinition>,
	instances: usize,
}

struct InstanceRecord {
	definition: Arc<PartDefinition>,
	object: Option<PartHandle>,
}

/// Owns part instances, their objects and the connections between them.
///
/// Instances may exist without an object: an instance whose prerequisites aren't met
/// stays in the graph and is built as soon as an update satisfies it.
pub struct InstanceEngine {
	factory: Arc<dyn PartFactory>,
	failure_policy: FailurePolicy,
	definitions: HashMap<PartTypeId, RegisteredDefinition>,
	instances: HashMap<PartInstanceId, InstanceRecord>,
	graph: ConnectionGraph<PartInstanceId, ImportId, ExportId>,
	removing: HashSet<PartInstanceId>,
}

impl InstanceEngine {

	/// Creates an empty engine that builds objects with `factory`.
	pub fn new( factory: impl PartFactory + 'static ) -> Self {
		Self {
			factory: Arc::new( factory ),
			failure_policy: FailurePolicy::default(),
			definitions: HashMap::new(),
			instances: HashMap::new(),
			graph: ConnectionGraph::new(),
			removing: HashSet::new(),
		}
	}

	/// Sets how reconstruction cascades treat failing dependents.
	pub fn with_failure_policy( mut self, policy: FailurePolicy ) -> Self {
		self.failure_policy = policy ;
		self
	}

	#[inline] pub fn failure_policy( &self ) -> FailurePolicy { self.failure_policy }

	/// Registers an instance of `definition` without building it.
	///
	/// The first definition registered for a part type is shared by all of its
	/// instances until the last of them is released.
	pub fn register( &mut self, definition: Arc<PartDefinition> ) -> PartInstanceId {
		let registered = self.definitions
			.entry( definition.id().clone() )
			.or_insert_with(|| RegisteredDefinition { definition, instances: 0 });
		registered.instances += 1 ;
		let definition = Arc::clone( &registered.definition );
		let instance = PartInstanceId::mint();
		self.graph.add_vertex( instance );
		self.instances.insert( instance, InstanceRecord { definition, object: None });
		instance
	}

	/// Registers a new instance of `definition`, connects it and builds its object.
	///
	/// # Partial Success
	/// The instance is returned together with failures of other instances touched on
	/// the way.
	///
	/// # Errors
	/// - [`ComposeError::UnknownImport`], [`ComposeError::UnknownExport`] or
	///   [`ComposeError::UnknownInstance`] for an invalid connection; nothing is registered.
	/// - [`ComposeError::ConstructionFailed`] if no object could be built. The instance
	///   stays registered and connected, so a later
	///   [`update_if_required`]( Self::update_if_required ) can retry.
	pub fn construct(
		&mut self,
		definition: Arc<PartDefinition>,
		connections: Vec<ImportConnection>,
	) -> PartialResult<PartInstanceId, ComposeError> {

		if let Err( error ) = self.validate( &definition, &connections ) { return Err(( error, Vec::new() )) }

		let instance = self.register( definition );
		let mut errors = self.update( instance, connections, &UpdateRequest::default() ).errors ;

		if self.is_live( instance ) { return Ok(( instance, errors )) }

		let own_failure = errors.iter().position(| error | matches!(
			error,
			ComposeError::ConstructionFailed { instance: failed, .. } if *failed == instance
		));
		let primary = match own_failure {
			Some( position ) => errors.remove( position ),
			None => ComposeError::ConstructionFailed { instance, cause: self.unsatisfied_cause( instance ) },
		};
		Err(( primary, errors ))

	}

	/// Replaces the connections of `instance` and brings its object in line with them.
	///
	/// Returns every instance that changed, dependents first. Calling it again with the
	/// same connections changes nothing.
	///
	/// # Partial Success
	/// Failures of individual instances are returned alongside the changes that did
	/// happen. Whether a failing dependent stops the cascade is set by the
	/// [`FailurePolicy`].
	///
	/// # Errors
	/// Fails without changing anything if `instance` is unknown or a connection names an
	/// unknown instance, import or export.
	pub fn update_if_required(
		&mut self,
		instance: PartInstanceId,
		connections: Vec<ImportConnection>,
	) -> PartialResult<Vec<InstanceUpdate>, ComposeError> {
		let Some( record ) = self.instances.get( &instance ) else {
			return Err(( ComposeError::UnknownInstance( instance ), Vec::new() ))
		};
		let definition = Arc::clone( &record.definition );
		if let Err( error ) = self.validate( &definition, &connections ) { return Err(( error, Vec::new() )) }
		let outcome = self.update( instance, connections, &UpdateRequest::default() );
		Ok(( outcome.updates, outcome.errors ))
	}

	/// Removes `instance`, disposing of its object.
	///
	/// Dependents left without a prerequisite are removed as well; the rest are updated
	/// with their remaining connections. The released instance is the last record.
	///
	/// # Errors
	/// Fails if `instance` is unknown.
	pub fn release( &mut self, instance: PartInstanceId ) -> PartialResult<Vec<InstanceUpdate>, ComposeError> {
		if !self.instances.contains_key( &instance ) {
			return Err(( ComposeError::UnknownInstance( instance ), Vec::new() ))
		}
		let outcome = self.remove( instance );
		Ok(( outcome.updates, outcome.errors ))
	}

	#[inline] pub fn contains( &self, instance: PartInstanceId ) -> bool { self.instances.contains_key( &instance ) }

	/// Whether `instance` currently has an object.
	#[inline]
	pub fn is_live( &self, instance: PartInstanceId ) -> bool {
		self.instances.get( &instance ).is_some_and(| record | record.object.is_some() )
	}

	#[inline]
	pub fn definition( &self, instance: PartInstanceId ) -> Option<&Arc<PartDefinition>> {
		self.instances.get( &instance ).map(| record | &record.definition )
	}

	/// The instance's live object.
	#[inline]
	pub fn object( &self, instance: PartInstanceId ) -> Option<&PartHandle> {
		self.instances.get( &instance ).and_then(| record | record.object.as_ref() )
	}

	/// Current connections of `instance`, in the order they were made.
	pub fn connections( &self, instance: PartInstanceId ) -> Vec<ImportConnection> {
		if !self.graph.contains_vertex( &instance ) { return Vec::with_capacity( 0 ) }
		self.graph.in_edges( &instance ).into_iter().map( ImportConnection::from ).collect()
	}

	/// Instances importing from `instance`, without duplicates.
	pub fn dependents( &self, instance: PartInstanceId ) -> Vec<PartInstanceId> {
		if !self.graph.contains_vertex( &instance ) { return Vec::with_capacity( 0 ) }
		let mut seen = HashSet::new();
		self.graph.out_edges( &instance ).into_iter()
			.map(| edge | edge.importer )
			.filter(| dependent | seen.insert( *dependent ))
			.collect()
	}

	/// Every registered instance, in no particular order.
	pub fn instances( &self ) -> impl Iterator<Item = PartInstanceId> + '_ { self.instances.keys().copied() }

	#[inline] pub fn instance_count( &self ) -> usize { self.instances.len() }

	/// Number of distinct part types with at least one registered instance.
	#[inline] pub fn definition_count( &self ) -> usize { self.definitions.len() }

	/// Orders `subset` so every provider precedes its dependents.
	///
	/// # Errors
	/// Returns [`GraphError::CycleDetected`] if the subset contains a cycle.
	pub fn topological_order<'a>(
		&self,
		subset: impl IntoIterator<Item = &'a PartInstanceId>,
	) -> Result<Vec<PartInstanceId>, GraphError<PartInstanceId>> {
		self.graph.topological_sort( subset )
	}

	/// Whether `instance` is live or could be built once its providers are.
	pub fn can_be_instantiated( &self, instance: PartInstanceId ) -> bool {
		satisfaction::can_be_instantiated( self, instance )
	}

	fn validate( &self, definition: &PartDefinition, connections: &[ImportConnection] ) -> Result<(), ComposeError> {
		connections.iter().try_for_each(| connection | {
			if definition.import( &connection.import ).is_none() {
				return Err( ComposeError::UnknownImport { part: definition.id().clone(), import: connection.import.clone() })
			}
			let provider = self.instances.get( &connection.provider )
				.ok_or( ComposeError::UnknownInstance( connection.provider ))?;
			match provider.definition.export( &connection.export ) {
				Some( _ ) => Ok(()),
				None => Err( ComposeError::UnknownExport { part: provider.definition.id().clone(), export: connection.export.clone() }),
			}
		})
	}

	fn unsatisfied_cause( &self, instance: PartInstanceId ) -> ConstructionError {
		let unsatisfied = satisfaction::unsatisfied_prerequisites( self, instance );
		match non_empty( unsatisfied ) {
			Some( imports ) => ConstructionError::MissingPrerequisites( imports ),
			None => ConstructionError::Factory( "the instance has no object".into() ),
		}
	}
}

impl DependencyView for InstanceEngine {

	type Id = PartInstanceId ;

	fn definition( &self, id: PartInstanceId ) -> Option<&PartDefinition> {
		self.instances.get( &id ).map(| record | record.definition.as_ref() )
	}

	fn is_live( &self, id: PartInstanceId ) -> bool { InstanceEngine::is_live( self, id ) }

	fn providers( &self, id: PartInstanceId, import: &ImportId ) -> Vec<PartInstanceId> {
		if !self.graph.contains_vertex( &id ) { return Vec::with_capacity( 0 ) }
		self.graph.in_edges( &id ).into_iter()
			.filter(| edge | edge.import == *import )
			.map(| edge | edge.exporter )
			.collect()
	}
}

impl std::fmt::Debug for InstanceEngine {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "InstanceEngine" )
			.field( "failure_policy", &self.failure_policy )
			.field( "instances", &self.instances.len() )
			.field( "connections", &self.graph.edge_count() )
			.finish_non_exhaustive()
	}
}
