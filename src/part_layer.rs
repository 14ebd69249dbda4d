//! Part composition layer.
//!
//! Sits between the group layer and the [`InstanceEngine`]. Its vertices are composed
//! parts, which outlive the instances built for them: when a cascade removes an
//! instance, the part stays in the composition with no instance and is instantiated
//! again by a later [`sync`]( PartLayer::sync ) once its prerequisites are back.

use std::collections::{ HashMap, HashSet, VecDeque };
use std::sync::Arc ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use tracing::{ debug, warn };
use uuid::Uuid ;

use crate::definition::{ PartDefinition, PartTypeId, ImportId, ExportId };
use crate::graph::{ Connection, ConnectionGraph, GraphError };
use crate::lifecycle::{ InstanceEngine, PartInstanceId, ImportConnection, InstanceUpdate, InstanceChange, ComposeError };
use crate::part::PartHandle ;
use crate::satisfaction::{ self, DependencyView };
use crate::utils::{ PartialResult, PartialSuccess };



/// Identity of a part placed in the composition.
#[derive( Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd )]
pub struct PartCompositionId( Uuid );

impl PartCompositionId {
	pub(crate) fn mint() -> Self { Self( Uuid::new_v4() ) }
	#[inline] pub fn as_uuid( &self ) -> &Uuid { &self.0 }
}

impl std::fmt::Display for PartCompositionId {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.0 )}
}

/// An import of one composed part satisfied by an export of another.
pub type PartConnection = Connection<PartCompositionId, ImportId, ExportId>;

#[derive( Debug, Error )]
pub enum PartCompositionError {

	#[error( "Unknown part {0}" )]
	UnknownPart( PartCompositionId ),

	#[error( "Part '{part}' has no import '{import}'" )]
	UnknownImport { part: PartTypeId, import: ImportId },

	#[error( "Part '{part}' has no export '{export}'" )]
	UnknownExport { part: PartTypeId, export: ExportId },

	#[error( transparent )]
	Compose( #[from] ComposeError ),

}

struct ComposedPart {
	definition: Arc<PartDefinition>,
	instance: Option<PartInstanceId>,
}

/// Composed parts, their connections and the instances built for them.
#[derive( Debug )]
pub struct PartLayer {
	engine: InstanceEngine,
	graph: ConnectionGraph<PartCompositionId, ImportId, ExportId>,
	parts: HashMap<PartCompositionId, ComposedPart>,
	instance_index: HashMap<PartInstanceId, PartCompositionId>,
}

impl std::fmt::Debug for ComposedPart {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComposedPart" )
			.field( "definition", self.definition.id() )
			.field( "instance", &self.instance )
			.finish()
	}
}

impl PartLayer {

	pub fn new( engine: InstanceEngine ) -> Self {
		Self { engine, graph: ConnectionGraph::new(), parts: HashMap::new(), instance_index: HashMap::new() }
	}

	#[inline] pub fn engine( &self ) -> &InstanceEngine { &self.engine }

	/// Places a part in the composition. Nothing is instantiated until [`sync`]( Self::sync ).
	pub fn add( &mut self, definition: Arc<PartDefinition> ) -> PartCompositionId {
		let part = PartCompositionId::mint();
		self.graph.add_vertex( part );
		self.parts.insert( part, ComposedPart { definition, instance: None });
		part
	}

	/// Adds a connection between two composed parts. Instances follow on the next sync.
	///
	/// # Errors
	/// Fails without changing anything if either part is unknown or the import or export
	/// isn't declared by its part's definition.
	pub fn connect( &mut self, connection: PartConnection ) -> Result<(), PartCompositionError> {
		self.validate( &connection )?;
		self.graph.add_edge( connection );
		Ok(())
	}

	/// Removes every connection equal to `connection`, returning how many were removed.
	pub fn disconnect( &mut self, connection: &PartConnection ) -> usize {
		if !self.graph.contains_vertex( &connection.importer ) { return 0 }
		self.graph.remove_in_edges_if( &connection.importer, | edge | edge == connection ).len()
	}

	/// Removes a part from the composition and releases its instance.
	///
	/// Parts that imported from it are synced afterwards, so the ones that lost their
	/// instance are rebuilt if another provider still satisfies them.
	///
	/// # Errors
	/// Fails if the part is unknown.
	pub fn remove( &mut self, part: PartCompositionId ) -> PartialResult<Vec<InstanceUpdate>, PartCompositionError> {

		let Some( composed ) = self.parts.get( &part ) else {
			return Err(( PartCompositionError::UnknownPart( part ), Vec::new() ))
		};
		let instance = composed.instance ;
		let dependents = self.graph.out_edges( &part ).into_iter()
			.map(| edge | edge.importer )
			.filter(| dependent | *dependent != part )
			.collect::<HashSet<_>>();

		let mut updates = Vec::new();
		let mut errors = Vec::new();
		if let Some( instance ) = instance.filter(| instance | self.engine.contains( *instance )) {
			match self.engine.release( instance ) {
				Ok(( released, failures )) => {
					self.forget_removed( &released );
					updates.extend( released );
					errors.extend( failures.into_iter().map( PartCompositionError::from ));
				},
				Err(( error, failures )) => {
					errors.push( error.into() );
					errors.extend( failures.into_iter().map( PartCompositionError::from ));
				},
			}
		}

		self.graph.remove_vertex( &part );
		self.parts.remove( &part );
		if let Some( instance ) = instance { self.instance_index.remove( &instance ); }
		debug!( %part, "part removed from composition" );

		let ( synced, failures ) = self.sync( dependents );
		updates.extend( synced );
		errors.extend( failures );
		Ok(( updates, errors ))

	}

	/// Brings the instances of `roots` and of everything depending on them in line with
	/// the composition.
	///
	/// Parts are visited providers first. A part with an instance has it updated with
	/// the current connections; a part without one is instantiated if it can be.
	///
	/// # Partial Success
	/// Failures are collected per part; the remaining parts are still synced.
	pub fn sync( &mut self, roots: impl IntoIterator<Item = PartCompositionId> ) -> PartialSuccess<Vec<InstanceUpdate>, PartCompositionError> {

		let order = self.dependent_closure( roots ).pipe(| closure | match self.graph.topological_sort( &closure ) {
			Ok( order ) => order,
			Err( GraphError::CycleDetected( part )) => {
				warn!( %part, "composed parts form a cycle, syncing in discovery order" );
				closure
			},
		});

		let mut updates = Vec::new();
		let mut errors = Vec::new();
		for part in order {
			let Some( composed ) = self.parts.get( &part ) else { continue };
			let definition = Arc::clone( &composed.definition );
			let connections = self.instance_connections( part );

			match composed.instance.filter(| instance | self.engine.contains( *instance )) {
				Some( instance ) => match self.engine.update_if_required( instance, connections ) {
					Ok(( changed, failures )) => {
						self.forget_removed( &changed );
						updates.extend( changed );
						errors.extend( failures.into_iter().map( PartCompositionError::from ));
					},
					Err(( error, failures )) => {
						errors.push( error.into() );
						errors.extend( failures.into_iter().map( PartCompositionError::from ));
					},
				},
				None if satisfaction::can_be_instantiated( &*self, part ) => {
					debug!( %part, definition = %definition.id(), "instantiating part" );
					match self.engine.construct( definition, connections ) {
						Ok(( instance, failures )) => {
							self.bind( part, instance );
							updates.push( InstanceUpdate { instance, change: InstanceChange::Reconstructed });
							errors.extend( failures.into_iter().map( PartCompositionError::from ));
						},
						Err(( error, failures )) => {
							// The instance stays registered without an object, so later syncs retry it.
							if let ComposeError::ConstructionFailed { instance, .. } = &error { self.bind( part, *instance ); }
							errors.push( error.into() );
							errors.extend( failures.into_iter().map( PartCompositionError::from ));
						},
					}
				},
				None => debug!( %part, "part cannot be instantiated yet" ),
			}
		}

		( updates, errors )

	}

	/// Releases an instance directly, keeping the composition's part-to-instance mapping
	/// consistent with the cascade.
	///
	/// # Errors
	/// Fails if the instance is unknown.
	pub fn release_instance( &mut self, instance: PartInstanceId ) -> PartialResult<Vec<InstanceUpdate>, ComposeError> {
		let ( updates, errors ) = self.engine.release( instance )?;
		self.forget_removed( &updates );
		Ok(( updates, errors ))
	}

	/// Constructs an instance outside the composition.
	///
	/// # Errors
	/// See [`InstanceEngine::construct`].
	pub fn construct_instance(
		&mut self,
		definition: Arc<PartDefinition>,
		connections: Vec<ImportConnection>,
	) -> PartialResult<PartInstanceId, ComposeError> {
		self.engine.construct( definition, connections )
	}

	/// Updates an instance directly, keeping the part-to-instance mapping consistent.
	///
	/// # Errors
	/// See [`InstanceEngine::update_if_required`].
	pub fn update_instance(
		&mut self,
		instance: PartInstanceId,
		connections: Vec<ImportConnection>,
	) -> PartialResult<Vec<InstanceUpdate>, ComposeError> {
		let ( updates, errors ) = self.engine.update_if_required( instance, connections )?;
		self.forget_removed( &updates );
		Ok(( updates, errors ))
	}

	#[inline] pub fn contains( &self, part: PartCompositionId ) -> bool { self.parts.contains_key( &part ) }

	#[inline]
	pub fn definition( &self, part: PartCompositionId ) -> Option<&Arc<PartDefinition>> {
		self.parts.get( &part ).map(| composed | &composed.definition )
	}

	/// The instance currently built for `part`.
	#[inline]
	pub fn instance( &self, part: PartCompositionId ) -> Option<PartInstanceId> {
		self.parts.get( &part ).and_then(| composed | composed.instance )
	}

	/// The composed part an instance was built for.
	#[inline]
	pub fn part_of( &self, instance: PartInstanceId ) -> Option<PartCompositionId> {
		self.instance_index.get( &instance ).copied()
	}

	#[inline]
	pub fn object( &self, part: PartCompositionId ) -> Option<&PartHandle> {
		self.instance( part ).and_then(| instance | self.engine.object( instance ))
	}

	/// Whether `part` has a live object.
	#[inline]
	pub fn is_live( &self, part: PartCompositionId ) -> bool {
		self.instance( part ).is_some_and(| instance | self.engine.is_live( instance ))
	}

	/// Connections into `part`, in the order they were made.
	pub fn connections( &self, part: PartCompositionId ) -> Vec<PartConnection> {
		if !self.graph.contains_vertex( &part ) { return Vec::with_capacity( 0 ) }
		self.graph.in_edges( &part )
	}

	pub fn parts( &self ) -> impl Iterator<Item = PartCompositionId> + '_ { self.parts.keys().copied() }

	/// Orders `subset` so every provider precedes its dependents.
	///
	/// # Errors
	/// Returns [`GraphError::CycleDetected`] if the subset contains a cycle.
	pub fn topological_order<'a>(
		&self,
		subset: impl IntoIterator<Item = &'a PartCompositionId>,
	) -> Result<Vec<PartCompositionId>, GraphError<PartCompositionId>> {
		self.graph.topological_sort( subset )
	}

	fn validate( &self, connection: &PartConnection ) -> Result<(), PartCompositionError> {
		let importer = self.parts.get( &connection.importer ).ok_or( PartCompositionError::UnknownPart( connection.importer ))?;
		let exporter = self.parts.get( &connection.exporter ).ok_or( PartCompositionError::UnknownPart( connection.exporter ))?;
		if importer.definition.import( &connection.import ).is_none() {
			return Err( PartCompositionError::UnknownImport {
				part: importer.definition.id().clone(),
				import: connection.import.clone(),
			})
		}
		if exporter.definition.export( &connection.export ).is_none() {
			return Err( PartCompositionError::UnknownExport {
				part: exporter.definition.id().clone(),
				export: connection.export.clone(),
			})
		}
		Ok(())
	}

	/// Connections of `part` translated to instance level. Providers without an instance
	/// are left out.
	fn instance_connections( &self, part: PartCompositionId ) -> Vec<ImportConnection> {
		self.graph.in_edges( &part ).into_iter()
			.filter_map(| edge | {
				let provider = self.instance( edge.exporter ).filter(| instance | self.engine.contains( *instance ))?;
				Some( ImportConnection { import: edge.import, provider, export: edge.export })
			})
			.collect()
	}

	fn dependent_closure( &self, roots: impl IntoIterator<Item = PartCompositionId> ) -> Vec<PartCompositionId> {
		let mut seen = HashSet::new();
		let mut queue = roots.into_iter()
			.filter(| part | self.parts.contains_key( part ) && seen.insert( *part ))
			.collect::<VecDeque<_>>();
		let mut closure = queue.iter().copied().collect::<Vec<_>>();
		while let Some( part ) = queue.pop_front() {
			for edge in self.graph.out_edges( &part ) {
				if seen.insert( edge.importer ) {
					closure.push( edge.importer );
					queue.push_back( edge.importer );
				}
			}
		}
		closure
	}

	fn bind( &mut self, part: PartCompositionId, instance: PartInstanceId ) {
		if let Some( composed ) = self.parts.get_mut( &part ) {
			if let Some( previous ) = composed.instance.replace( instance ) { self.instance_index.remove( &previous ); }
		}
		self.instance_index.insert( instance, part );
	}

	fn forget_removed( &mut self, updates: &[InstanceUpdate] ) {
		updates.iter()
			.filter(| update | update.change == InstanceChange::Removed )
			.for_each(| update | {
				let Some( part ) = self.instance_index.remove( &update.instance ) else { return };
				if let Some( composed ) = self.parts.get_mut( &part ) { composed.instance = None ; }
			});
	}
}

impl DependencyView for PartLayer {

	type Id = PartCompositionId ;

	fn definition( &self, id: PartCompositionId ) -> Option<&PartDefinition> {
		self.parts.get( &id ).map(| composed | composed.definition.as_ref() )
	}

	fn is_live( &self, id: PartCompositionId ) -> bool { PartLayer::is_live( self, id ) }

	fn providers( &self, id: PartCompositionId, import: &ImportId ) -> Vec<PartCompositionId> {
		if !self.graph.contains_vertex( &id ) { return Vec::with_capacity( 0 ) }
		self.graph.in_edges( &id ).into_iter()
			.filter(| edge | edge.import == *import )
			.map(| edge | edge.exporter )
			.collect()
	}
}
