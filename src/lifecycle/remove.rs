use std::collections::HashSet ;
use tracing::debug ;

use super::{ InstanceEngine, PartInstanceId, InstanceUpdate, InstanceChange };
use super::update::{ UpdateOutcome, UpdateRequest };



impl InstanceEngine {

	/// Removes `instance` and settles its dependents first.
	///
	/// A dependent that loses every connection of a prerequisite import is removed
	/// recursively; any other dependent is updated with its remaining connections.
	pub(super) fn remove( &mut self, instance: PartInstanceId ) -> UpdateOutcome {

		let mut outcome = UpdateOutcome::default();
		if !self.instances.contains_key( &instance ) || !self.removing.insert( instance ) { return outcome }

		for dependent in self.dependents( instance ) {
			if dependent == instance || self.removing.contains( &dependent ) || !self.instances.contains_key( &dependent ) {
				continue
			}
			let current = self.connections( dependent );
			let severed = current.iter()
				.filter(| connection | connection.provider == instance )
				.map(| connection | &connection.import )
				.collect::<HashSet<_>>();
			let remaining = current.iter()
				.filter(| connection | connection.provider != instance && !self.removing.contains( &connection.provider ))
				.cloned()
				.collect::<Vec<_>>();
			let loses_prerequisite = self.definition( dependent ).is_some_and(| definition | definition
				.prerequisite_imports()
				.filter(| import | severed.contains( import.id() ))
				.any(| import | !remaining.iter().any(| connection | connection.import == *import.id() ))
			);
			let result = match loses_prerequisite {
				true => {
					debug!( %instance, %dependent, "dependent loses a prerequisite" );
					self.remove( dependent )
				},
				false => self.update( dependent, remaining, &UpdateRequest::default() ),
			};
			outcome.absorb( result );
		}

		self.destroy_object( instance );
		self.graph.remove_vertex( &instance );
		self.forget( instance );
		self.removing.remove( &instance );
		debug!( %instance, "instance removed" );
		outcome.updates.push( InstanceUpdate { instance, change: InstanceChange::Removed });
		outcome

	}

	/// Disposes of the instance's object, if it has one.
	pub(super) fn destroy_object( &mut self, instance: PartInstanceId ) {
		let Some( handle ) = self.instances.get_mut( &instance ).and_then(| record | record.object.take() ) else { return };
		debug!( %instance, "disposing object" );
		handle.write().dispose();
	}

	fn forget( &mut self, instance: PartInstanceId ) {
		let Some( record ) = self.instances.remove( &instance ) else { return };
		let part = record.definition.id();
		let drop_definition = match self.definitions.get_mut( part ) {
			Some( registered ) => {
				registered.instances = registered.instances.saturating_sub( 1 );
				registered.instances == 0
			},
			None => false,
		};
		if drop_definition {
			debug!( %part, "last instance released, dropping definition" );
			self.definitions.remove( part );
		}
	}
}
