use std::collections::{ HashSet, VecDeque };
use std::sync::Arc ;
use itertools::Itertools ;
use tracing::{ debug, warn };

use crate::definition::{ PartDefinition, ImportDefinition, ImportId };
use crate::graph::{ Connection, GraphError };
use crate::part::PartHandle ;
use crate::satisfaction ;
use super::{ InstanceEngine, PartInstanceId, ImportConnection, InstanceUpdate, InstanceChange, FailurePolicy, ComposeError, ConstructionError };



#[derive( Debug, Default )]
pub(super) struct UpdateRequest<'a> {
	/// Remove the instance regardless of its connections.
	pub force_delete: bool,
	/// Rebuild the object even if nothing changed.
	pub force_update: bool,
	/// Providers rebuilt earlier in the same cascade. Imports from them count as changed
	/// even though the connection itself is the same.
	pub replaced: Option<&'a HashSet<PartInstanceId>>,
	/// Set while an enclosing cascade is already walking the dependents.
	pub cascade: bool,
}

#[derive( Debug, Default )]
pub(super) struct UpdateOutcome {
	pub updates: Vec<InstanceUpdate>,
	pub errors: Vec<ComposeError>,
	/// The instance's object was replaced or lost, so dependents must be updated.
	pub replaced: bool,
}

impl UpdateOutcome {
	pub(super) fn absorb( &mut self, other: UpdateOutcome ) {
		self.updates.extend( other.updates );
		self.errors.extend( other.errors );
	}
}

impl InstanceEngine {

	/// Brings `instance` in line with `connections`.
	///
	/// Records are pushed dependents first; the instance's own record comes last.
	pub(super) fn update(
		&mut self,
		instance: PartInstanceId,
		connections: Vec<ImportConnection>,
		request: &UpdateRequest<'_>,
	) -> UpdateOutcome {

		let Some( record ) = self.instances.get( &instance ) else { return UpdateOutcome::default() };
		if self.removing.contains( &instance ) { return UpdateOutcome::default() }
		let definition = Arc::clone( &record.definition );
		let was_live = record.object.is_some();

		let changed = changed_imports( &self.connections( instance ), &connections, request.replaced );
		if changed.is_empty() && was_live && !request.force_update && !request.force_delete {
			return UpdateOutcome::default()
		}

		let missing = definition.prerequisite_imports()
			.filter(| import | !connections.iter().any(| connection | connection.import == *import.id() ))
			.map(| import | import.id().clone() )
			.collect::<Vec<_>>();
		if request.force_delete || ( was_live && !missing.is_empty() ) {
			debug!( %instance, ?missing, force = request.force_delete, "removing instance" );
			return self.remove( instance );
		}

		self.replace_connections( instance, &connections );

		if !was_live {
			let unsatisfied = satisfaction::unsatisfied_prerequisites( &*self, instance );
			if !unsatisfied.is_empty() {
				debug!( %instance, ?unsatisfied, "instance is not yet satisfied" );
				return UpdateOutcome::default()
			}
		}

		let recreate = !was_live || request.force_update || changed.iter()
			.filter_map(| import | definition.import( import ))
			.any( ImportDefinition::is_constructor );

		let result = match recreate {
			true => {
				debug!( %instance, part = %definition.id(), rebuild = was_live, "constructing object" );
				self.recreate( instance, &definition, &connections )
			},
			false => {
				debug!( %instance, part = %definition.id(), ?changed, "reassigning property imports" );
				self.assign_properties( instance, &definition, &connections )
			},
		};

		let mut outcome = UpdateOutcome::default();
		let succeeded = match result {
			Ok(()) => true,
			Err( cause ) => {
				warn!( %instance, part = %definition.id(), %cause, "instance update failed" );
				// A partly assigned object doesn't stay live.
				if !recreate { self.destroy_object( instance ); }
				outcome.errors.push( ComposeError::ConstructionFailed { instance, cause });
				false
			},
		};
		outcome.replaced = recreate || !succeeded ;

		// A failed retry of an object that never existed leaves dependents as they were.
		let dependents_affected = was_live || self.is_live( instance );
		if outcome.replaced && dependents_affected && !request.cascade {
			outcome.absorb( self.propagate( instance ));
		}

		if succeeded {
			let change = match recreate {
				true => InstanceChange::Reconstructed,
				false => InstanceChange::Updated,
			};
			outcome.updates.push( InstanceUpdate { instance, change });
		}

		outcome

	}

	/// Updates every transitive dependent of `instance` once, providers before dependents.
	fn propagate( &mut self, instance: PartInstanceId ) -> UpdateOutcome {

		let mut outcome = UpdateOutcome::default();
		let dependents = self.dependent_closure( instance );
		if dependents.is_empty() { return outcome }

		let order = match self.graph.topological_sort( &dependents ) {
			Ok( order ) => order,
			Err( GraphError::CycleDetected( vertex )) => {
				warn!( %instance, %vertex, "dependents form a cycle, updating in discovery order" );
				dependents
			},
		};

		let mut replaced = HashSet::from([ instance ]);
		for dependent in order {
			if self.failure_policy == FailurePolicy::HaltOnFirst && !outcome.errors.is_empty() {
				debug!( %instance, "halting cascade after first failure" );
				break
			}
			if !self.instances.contains_key( &dependent ) { continue }
			let connections = self.connections( dependent );
			let result = self.update( dependent, connections, &UpdateRequest {
				replaced: Some( &replaced ),
				cascade: true,
				..UpdateRequest::default()
			});
			if result.replaced { replaced.insert( dependent ); }
			outcome.absorb( result );
		}

		outcome

	}

	/// Transitive dependents of `instance` in breadth-first discovery order, excluding itself.
	fn dependent_closure( &self, instance: PartInstanceId ) -> Vec<PartInstanceId> {
		let mut seen = HashSet::from([ instance ]);
		let mut queue = VecDeque::from([ instance ]);
		let mut closure = Vec::new();
		while let Some( vertex ) = queue.pop_front() {
			for dependent in self.dependents( vertex ) {
				if seen.insert( dependent ) {
					closure.push( dependent );
					queue.push_back( dependent );
				}
			}
		}
		closure
	}

	fn replace_connections( &mut self, instance: PartInstanceId, connections: &[ImportConnection] ) {
		self.graph.remove_in_edges_if( &instance, |_| true );
		connections.iter().for_each(| connection | self.graph.add_edge( Connection {
			importer: instance,
			import: connection.import.clone(),
			exporter: connection.provider,
			export: connection.export.clone(),
		}));
	}

	/// Disposes of the current object, builds a new one and assigns its property imports.
	///
	/// On failure the instance is left without an object.
	fn recreate(
		&mut self,
		instance: PartInstanceId,
		definition: &PartDefinition,
		connections: &[ImportConnection],
	) -> Result<(), ConstructionError> {
		self.destroy_object( instance );
		let arguments = self.constructor_arguments( definition, connections )?;
		let part = self.factory.construct( definition, arguments ).map_err( ConstructionError::Factory )?;
		if let Some( record ) = self.instances.get_mut( &instance ) {
			record.object = Some( PartHandle::new( part ));
		}
		let assigned = self.assign_properties( instance, definition, connections );
		if assigned.is_err() { self.destroy_object( instance ); }
		assigned
	}

	/// Assigns every property import of the live object, resetting absent ones to empty.
	fn assign_properties(
		&self,
		instance: PartInstanceId,
		definition: &PartDefinition,
		connections: &[ImportConnection],
	) -> Result<(), ConstructionError> {
		let Some( handle ) = self.object( instance ) else { return Ok(()) };
		definition.property_imports().try_for_each(| import | {
			let value = self.resolve_import( import, connections )?;
			handle.write().import( import, value ).map_err(| source | ConstructionError::Assignment {
				import: import.id().clone(),
				source,
			})
		})
	}
}

/// Imports whose connection list differs between `current` and `requested`, plus
/// imports connected to a provider in `replaced`.
fn changed_imports(
	current: &[ImportConnection],
	requested: &[ImportConnection],
	replaced: Option<&HashSet<PartInstanceId>>,
) -> HashSet<ImportId> {

	let group = | connections: &[ImportConnection] | connections.iter()
		.map(| connection | ( connection.import.clone(), ( connection.provider, connection.export.clone() )))
		.into_group_map();
	let before = group( current );
	let after = group( requested );

	let differing = before.keys().chain( after.keys() )
		.unique()
		.filter(| import | before.get( *import ) != after.get( *import ))
		.cloned();
	let from_replaced = requested.iter()
		.filter(| connection | replaced.is_some_and(| replaced | replaced.contains( &connection.provider )))
		.map(| connection | connection.import.clone() );

	differing.chain( from_replaced ).collect()

}
