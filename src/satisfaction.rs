//! Decides whether a part can be instantiated from the current graph connectivity.
//!
//! Both the instance engine and the part composition layer expose their state
//! through [`DependencyView`], so the same evaluation drives automatic instantiation
//! when parts and connections are added in bulk.

use std::collections::HashMap ;
use std::fmt::Debug ;
use std::hash::Hash ;

use crate::definition::{ PartDefinition, ImportId };



/// Read access to a dependency graph for satisfaction checks.
pub trait DependencyView {
	/// Vertex id of the graph.
	type Id: Copy + Eq + Hash + Debug ;

	/// The definition of the part behind `id`.
	fn definition( &self, id: Self::Id ) -> Option<&PartDefinition> ;

	/// Whether `id` currently has a live object.
	fn is_live( &self, id: Self::Id ) -> bool ;

	/// Vertices currently connected to `import` of `id`, in connection order.
	fn providers( &self, id: Self::Id, import: &ImportId ) -> Vec<Self::Id> ;
}

/// Whether `id` is live, or every prerequisite import has at least one provider that
/// can itself be instantiated.
///
/// Prerequisite cycles are never satisfiable. Each vertex settles once per evaluation
/// unless an ancestor it was assumed unsatisfiable against turns out satisfiable, so
/// the cost stays polynomial in the size of the graph.
pub fn can_be_instantiated<V: DependencyView + ?Sized>( view: &V, id: V::Id ) -> bool {
	Evaluator {
		view,
		on_stack: HashMap::new(),
		memo: HashMap::new(),
		pending: Vec::new(),
		pending_low: HashMap::new(),
		low: usize::MAX,
	}.evaluate( id )
}

/// Prerequisite imports of `id` that have no live provider right now.
///
/// Unlike [`can_be_instantiated`] this doesn't look past direct providers: it answers
/// whether the part could be built immediately.
pub fn unsatisfied_prerequisites<V: DependencyView + ?Sized>( view: &V, id: V::Id ) -> Vec<ImportId> {
	let Some( definition ) = view.definition( id ) else { return Vec::with_capacity( 0 ) };
	definition.prerequisite_imports()
		.filter(| import | !view.providers( id, import.id() ).into_iter().any(| provider | view.is_live( provider )))
		.map(| import | import.id().clone() )
		.collect()
}

struct Evaluator<'a, V: DependencyView + ?Sized> {
	view: &'a V,
	// Vertices being evaluated, with their depth on the path.
	on_stack: HashMap<V::Id, usize>,
	memo: HashMap<V::Id, bool>,
	// Provisional `false` results that assumed some vertex still on the path is
	// unsatisfiable, in the order they settled, with the lowest depth they rely on.
	pending: Vec<V::Id>,
	pending_low: HashMap<V::Id, usize>,
	// Lowest path depth the current evaluation has assumed to be unsatisfiable.
	low: usize,
}

impl<V: DependencyView + ?Sized> Evaluator<'_, V> {

	fn evaluate( &mut self, id: V::Id ) -> bool {

		if let Some( known ) = self.memo.get( &id ) { return *known }
		if self.view.is_live( id ) {
			self.memo.insert( id, true );
			return true
		}

		let view = self.view ;
		let Some( definition ) = view.definition( id ) else { return false };

		if let Some( depth ) = self.on_stack.get( &id ).or_else(|| self.pending_low.get( &id )).copied() {
			self.low = self.low.min( depth );
			return false
		}

		let depth = self.on_stack.len();
		self.on_stack.insert( id, depth );
		let pending_before = self.pending.len();
		let low_before = std::mem::replace( &mut self.low, usize::MAX );

		let satisfied = definition.prerequisite_imports().all(| import | view
			.providers( id, import.id() )
			.into_iter()
			.any(| provider | self.evaluate( provider ))
		);

		self.on_stack.remove( &id );
		let low = std::mem::replace( &mut self.low, low_before );
		let settled = self.pending.split_off( pending_before );

		match satisfied {
			// Anything that assumed this vertex was unsatisfiable is evaluated again when reached.
			true => settled.iter().for_each(| vertex | { self.pending_low.remove( vertex ); }),
			false if low >= depth => settled.into_iter().chain([ id ]).for_each(| vertex | {
				self.pending_low.remove( &vertex );
				self.memo.insert( vertex, false );
			}),
			false => {
				self.low = self.low.min( low );
				settled.into_iter().chain([ id ]).for_each(| vertex | {
					self.pending_low.insert( vertex, low );
					self.pending.push( vertex );
				});
			},
		}
		if satisfied { self.memo.insert( id, true ); }
		satisfied

	}
}
