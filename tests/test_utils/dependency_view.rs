#[allow( dead_code )]
mod dependency_view {

	use std::cell::Cell ;
	use std::collections::{ HashMap, HashSet };
	use part_link::{ PartDefinition, ImportDefinition, ImportId };
	use part_link::satisfaction::DependencyView ;

	/// A fixed dependency graph of numbered parts.
	#[derive( Default )]
	pub struct StaticView {
		parts: HashMap<usize, PartDefinition>,
		live: HashSet<usize>,
		providers: HashMap<( usize, ImportId ), Vec<usize>>,
		lookups: Cell<usize>,
	}

	impl StaticView {

		/// Adds part `id` with the given prerequisite and optional imports.
		pub fn part( mut self, id: usize, prerequisites: &[&str], optional: &[&str] ) -> Self {
			let builder = prerequisites.iter().enumerate().fold(
				PartDefinition::builder( format!( "part{}", id )),
				| builder, ( parameter, import )| builder.import( ImportDefinition::constructor( *import, parameter, "C" )),
			);
			let builder = optional.iter().fold( builder, | builder, import | builder.import( ImportDefinition::property( *import, *import, "C" )));
			let ( definition, errors ) = builder.build();
			assert!( errors.is_empty(), "Produced errors: {:?}", errors );
			self.parts.insert( id, definition );
			self
		}

		pub fn live( mut self, id: usize ) -> Self {
			self.live.insert( id );
			self
		}

		/// Connects `import` of `importer` to `provider`.
		pub fn connect( mut self, importer: usize, import: &str, provider: usize ) -> Self {
			self.providers.entry(( importer, ImportId::new( import ))).or_default().push( provider );
			self
		}

		/// Number of provider lookups made through the view so far.
		pub fn lookups( &self ) -> usize { self.lookups.get() }
	}

	impl DependencyView for StaticView {

		type Id = usize ;

		fn definition( &self, id: usize ) -> Option<&PartDefinition> { self.parts.get( &id ) }

		fn is_live( &self, id: usize ) -> bool { self.live.contains( &id ) }

		fn providers( &self, id: usize, import: &ImportId ) -> Vec<usize> {
			self.lookups.set( self.lookups.get() + 1 );
			self.providers.get( &( id, import.clone() )).cloned().unwrap_or_default()
		}
	}
}
