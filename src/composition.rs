//! Thread-safe entry point.
//!
//! [`Composition`] puts the whole composition behind one `parking_lot::RwLock`: every
//! mutation holds the write lock for its full cascade, so readers only ever observe a
//! settled graph. It also keeps the catalog of part definitions received from the
//! scanning layer together with the origin each came from, so everything contributed
//! by a plugin can be removed in one call.

use std::collections::{ HashMap, HashSet };
use std::sync::Arc ;
use parking_lot::RwLock ;
use thiserror::Error ;
use tracing::{ debug, info };

use crate::definition::{ PartDefinition, PartTypeId, string_id };
use crate::graph::GraphError ;
use crate::group::{ GroupLayer, GroupDefinition, GroupId, GroupConnection, GroupImportId, GroupError, PartKey };
use crate::lifecycle::{ InstanceEngine, PartInstanceId, ImportConnection, InstanceUpdate, ComposeError };
use crate::part::{ PartFactory, PartHandle };
use crate::utils::{ PartialResult, PartialSuccess, Merge };



string_id! {
	/// Where a part definition came from, typically the plugin that contributed it.
	Origin
}

#[derive( Debug, Error )]
pub enum CompositionError {

	#[error( transparent )]
	Group( #[from] GroupError ),

	#[error( transparent )]
	Compose( #[from] ComposeError ),

	#[error( "Part type '{0}' has not been added to the catalog" )]
	UnknownDefinition( PartTypeId ),

}

struct CatalogEntry {
	definition: Arc<PartDefinition>,
	origin: Origin,
}

struct CompositionState {
	groups: GroupLayer,
	catalog: HashMap<PartTypeId, CatalogEntry>,
}

/// A live composition shared between threads.
pub struct Composition {
	state: RwLock<CompositionState>,
}

fn widen<T, E: Into<CompositionError>>( result: PartialResult<T, E> ) -> PartialResult<T, CompositionError> {
	match result {
		Ok(( value, errors )) => Ok(( value, errors.into_iter().map( Into::into ).collect() )),
		Err(( error, errors )) => Err(( error.into(), errors.into_iter().map( Into::into ).collect() )),
	}
}

impl Composition {

	/// Creates an empty composition that builds objects with `factory`.
	pub fn new( factory: impl PartFactory + 'static ) -> Self {
		Self::with_engine( InstanceEngine::new( factory ))
	}

	/// Creates an empty composition over a configured engine.
	pub fn with_engine( engine: InstanceEngine ) -> Self {
		Self { state: RwLock::new( CompositionState { groups: GroupLayer::new( engine ), catalog: HashMap::new() })}
	}

	/// Adds a definition to the catalog, replacing any earlier definition of the same part type.
	pub fn add_definition( &self, definition: PartDefinition, origin: impl Into<Origin> ) -> Arc<PartDefinition> {
		let definition = definition.into_shared();
		let origin = origin.into();
		debug!( part = %definition.id(), %origin, "definition added to catalog" );
		self.state.write().catalog.insert( definition.id().clone(), CatalogEntry { definition: Arc::clone( &definition ), origin });
		definition
	}

	pub fn definition( &self, part: &PartTypeId ) -> Option<Arc<PartDefinition>> {
		self.state.read().catalog.get( part ).map(| entry | Arc::clone( &entry.definition ))
	}

	/// Every catalog definition contributed by `origin`.
	pub fn definitions_from( &self, origin: &Origin ) -> Vec<Arc<PartDefinition>> {
		self.state.read().catalog.values()
			.filter(| entry | entry.origin == *origin )
			.map(| entry | Arc::clone( &entry.definition ))
			.collect()
	}

	/// Adds a group whose parts all come from the catalog.
	///
	/// # Errors
	/// Fails without changing anything if a part type isn't in the catalog; see
	/// [`GroupLayer::add`] for the rest.
	pub fn add_group( &self, group: GroupId, definition: GroupDefinition ) -> PartialResult<Vec<InstanceUpdate>, CompositionError> {
		let mut state = self.state.write();
		let unknown = definition.parts().iter().find(|( _, part )| !state.catalog.contains_key( part.id() ));
		if let Some(( _, part )) = unknown {
			return Err(( CompositionError::UnknownDefinition( part.id().clone() ), Vec::new() ))
		}
		widen( state.groups.add( group, definition.into_shared() ))
	}

	/// See [`GroupLayer::connect`].
	///
	/// # Errors
	/// See [`GroupLayer::connect`].
	pub fn connect( &self, connection: GroupConnection ) -> PartialResult<Vec<InstanceUpdate>, CompositionError> {
		widen( self.state.write().groups.connect( connection ))
	}

	/// See [`GroupLayer::disconnect`].
	pub fn disconnect( &self, connection: &GroupConnection ) -> PartialSuccess<Vec<InstanceUpdate>, CompositionError> {
		let ( updates, errors ) = self.state.write().groups.disconnect( connection );
		( updates, errors.into_iter().map( CompositionError::from ).collect() )
	}

	/// See [`GroupLayer::remove`].
	///
	/// # Errors
	/// Fails if `group` is unknown.
	pub fn remove_group( &self, group: GroupId ) -> PartialResult<Vec<InstanceUpdate>, CompositionError> {
		widen( self.state.write().groups.remove( group ))
	}

	/// Constructs a standalone instance, outside any group.
	///
	/// # Errors
	/// See [`InstanceEngine::construct`].
	pub fn construct( &self, definition: Arc<PartDefinition>, connections: Vec<ImportConnection> ) -> PartialResult<PartInstanceId, CompositionError> {
		widen( self.state.write().groups.part_layer_mut().construct_instance( definition, connections ))
	}

	/// # Errors
	/// See [`InstanceEngine::update_if_required`].
	pub fn update_if_required( &self, instance: PartInstanceId, connections: Vec<ImportConnection> ) -> PartialResult<Vec<InstanceUpdate>, CompositionError> {
		widen( self.state.write().groups.part_layer_mut().update_instance( instance, connections ))
	}

	/// # Errors
	/// See [`InstanceEngine::release`].
	pub fn release( &self, instance: PartInstanceId ) -> PartialResult<Vec<InstanceUpdate>, CompositionError> {
		widen( self.state.write().groups.part_layer_mut().release_instance( instance ))
	}

	/// Removes everything contributed by `origins`.
	///
	/// Groups containing a part from one of the origins are removed, remaining
	/// instances of their definitions are released, and the catalog entries dropped.
	///
	/// # Partial Success
	/// Failures while updating dependents are collected; the removal itself always
	/// completes.
	pub fn remove_plugins( &self, origins: impl IntoIterator<Item = Origin> ) -> PartialSuccess<Vec<InstanceUpdate>, CompositionError> {

		let origins = origins.into_iter().collect::<HashSet<_>>();
		let mut state = self.state.write();

		let doomed = state.catalog.iter()
			.filter(|( _, entry )| origins.contains( &entry.origin ))
			.map(|( part, _ )| part.clone() )
			.collect::<HashSet<_>>();

		let groups = state.groups.groups()
			.filter(| group | state.groups.group( *group ).is_some_and(| definition | definition
				.parts().iter()
				.any(|( _, part )| doomed.contains( part.id() ))
			))
			.collect::<Vec<_>>();

		let ( mut updates, mut errors ) = groups.iter().fold(( Vec::new(), Vec::new() ), |( updates, errors ), group | {
			match state.groups.remove( *group ) {
				Ok(( removed, failures )) => ( updates.merge_all( removed ), errors.merge_all( failures.into_iter().map( CompositionError::from ))),
				Err(( error, failures )) => ( updates, errors.merge( CompositionError::from( error )).merge_all( failures.into_iter().map( CompositionError::from ))),
			}
		});

		let standalone = state.groups.engine().instances()
			.filter(| instance | state.groups.engine().definition( *instance ).is_some_and(| definition | doomed.contains( definition.id() )))
			.collect::<Vec<_>>();
		for instance in standalone {
			if !state.groups.engine().contains( instance ) { continue }
			match state.groups.part_layer_mut().release_instance( instance ) {
				Ok(( released, failures )) => {
					updates.extend( released );
					errors.extend( failures.into_iter().map( CompositionError::from ));
				},
				Err(( error, failures )) => {
					errors.push( error.into() );
					errors.extend( failures.into_iter().map( CompositionError::from ));
				},
			}
		}

		state.catalog.retain(| part, _ | !doomed.contains( part ));
		info!( origins = origins.len(), definitions = doomed.len(), groups = groups.len(), instances = updates.len(), "plugins removed" );
		( updates, errors )

	}

	pub fn groups( &self ) -> Vec<GroupId> { self.state.read().groups.groups().collect() }

	pub fn group( &self, group: GroupId ) -> Option<Arc<GroupDefinition>> {
		self.state.read().groups.group( group ).cloned()
	}

	/// # Errors
	/// Fails if `group` is unknown.
	pub fn satisfied_imports( &self, group: GroupId ) -> Result<Vec<GroupImportId>, CompositionError> {
		Ok( self.state.read().groups.satisfied_imports( group )? )
	}

	/// # Errors
	/// Fails if `group` is unknown.
	pub fn unsatisfied_imports( &self, group: GroupId ) -> Result<Vec<GroupImportId>, CompositionError> {
		Ok( self.state.read().groups.unsatisfied_imports( group )? )
	}

	/// # Errors
	/// Fails if `group` is unknown.
	pub fn parts( &self, group: GroupId ) -> Result<Vec<( PartKey, Option<PartInstanceId> )>, CompositionError> {
		Ok( self.state.read().groups.parts( group )? )
	}

	/// The live object of a group part.
	pub fn part_object( &self, group: GroupId, key: &PartKey ) -> Option<PartHandle> {
		self.state.read().groups.object( group, key ).cloned()
	}

	/// The live object of an instance.
	pub fn object( &self, instance: PartInstanceId ) -> Option<PartHandle> {
		self.state.read().groups.engine().object( instance ).cloned()
	}

	pub fn is_live( &self, instance: PartInstanceId ) -> bool {
		self.state.read().groups.engine().is_live( instance )
	}

	/// Every instance, providers before their dependents.
	///
	/// # Errors
	/// Returns [`GraphError::CycleDetected`] if instances depend on each other in a cycle.
	pub fn topological_order( &self ) -> Result<Vec<PartInstanceId>, GraphError<PartInstanceId>> {
		let state = self.state.read();
		let engine = state.groups.engine();
		let instances = engine.instances().collect::<Vec<_>>();
		engine.topological_order( &instances )
	}

	/// Runs `inspect` against the group layer under the read lock.
	pub fn inspect<R>( &self, inspect: impl FnOnce( &GroupLayer ) -> R ) -> R {
		inspect( &self.state.read().groups )
	}
}

impl std::fmt::Debug for Composition {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct( "Composition" )
			.field( "definitions", &state.catalog.len() )
			.field( "groups", &state.groups )
			.finish()
	}
}
