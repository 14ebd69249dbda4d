//! Bidirectional connection graph.
//!
//! Vertices are opaque ids; each edge records that one import of the importing vertex
//! is satisfied by one export of the exporting vertex. Edges are stored directed from
//! exporter to importer, so a vertex's in-edges are its imports and its out-edges lead
//! to its dependents. Parallel edges between the same pair are allowed, one per import.
//!
//! The same store backs the instance graph, the part composition graph and the group
//! graph; only the id types differ.

use std::collections::{ HashMap, HashSet };
use std::hash::Hash ;
use std::fmt::Debug ;
use petgraph::Direction ;
use petgraph::algo::toposort ;
use petgraph::stable_graph::{ StableDiGraph, NodeIndex };
use petgraph::visit::{ EdgeRef, NodeFiltered };
use thiserror::Error ;



/// Errors raised by graph queries.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
pub enum GraphError<V: Debug> {
	/// The requested subset contains a cycle through this vertex.
	#[error( "Cycle detected at vertex {0:?}" )]
	CycleDetected( V ),
}

/// One import of `importer` satisfied by one export of `exporter`.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct Connection<V, I, E> {
	pub importer: V,
	pub import: I,
	pub exporter: V,
	pub export: E,
}

#[derive( Debug, Clone )]
struct EdgeData<I, E> {
	import: I,
	export: E,
	// Insertion order, so in-edges come back in the order they were connected.
	sequence: u64,
}

/// Directed multigraph over opaque vertex ids.
///
/// # Panics
/// Edge operations and edge queries on a vertex that isn't in the graph panic: callers
/// are expected to check [`contains_vertex`]( Self::contains_vertex ) first.
#[derive( Debug, Clone )]
pub struct ConnectionGraph<V, I, E> {
	graph: StableDiGraph<V, EdgeData<I, E>>,
	index: HashMap<V, NodeIndex>,
	next_sequence: u64,
}

impl<V, I, E> Default for ConnectionGraph<V, I, E> {
	fn default() -> Self {
		Self { graph: StableDiGraph::default(), index: HashMap::new(), next_sequence: 0 }
	}
}

impl<V, I, E> ConnectionGraph<V, I, E>
where
	V: Clone + Eq + Hash + Debug,
	I: Clone + Debug,
	E: Clone + Debug,
{

	pub fn new() -> Self { Self::default() }

	#[inline] pub fn contains_vertex( &self, vertex: &V ) -> bool { self.index.contains_key( vertex ) }
	#[inline] pub fn vertex_count( &self ) -> usize { self.graph.node_count() }
	#[inline] pub fn edge_count( &self ) -> usize { self.graph.edge_count() }

	/// All vertices, in no particular order.
	pub fn vertices( &self ) -> impl Iterator<Item = &V> { self.index.keys() }

	/// Adds an isolated vertex. Adding a vertex twice has no effect.
	pub fn add_vertex( &mut self, vertex: V ) {
		if self.index.contains_key( &vertex ) { return }
		let node = self.graph.add_node( vertex.clone() );
		self.index.insert( vertex, node );
	}

	/// Removes a vertex together with every edge incident to it.
	///
	/// Returns `false` if the vertex wasn't present.
	pub fn remove_vertex( &mut self, vertex: &V ) -> bool {
		match self.index.remove( vertex ) {
			Some( node ) => { self.graph.remove_node( node ); true },
			None => false,
		}
	}

	/// Adds an edge.
	///
	/// # Panics
	/// Panics if either endpoint isn't in the graph.
	pub fn add_edge( &mut self, connection: Connection<V, I, E> ) {
		let Connection { importer, import, exporter, export } = connection ;
		let source = self.node( &exporter );
		let target = self.node( &importer );
		let sequence = self.next_sequence ;
		self.next_sequence += 1 ;
		self.graph.add_edge( source, target, EdgeData { import, export, sequence });
	}

	/// Removes every in-edge of `vertex` matching `predicate`, returning the removed edges.
	///
	/// # Panics
	/// Panics if the vertex isn't in the graph.
	pub fn remove_in_edges_if(
		&mut self,
		vertex: &V,
		mut predicate: impl FnMut( &Connection<V, I, E> ) -> bool,
	) -> Vec<Connection<V, I, E>> {
		let node = self.node( vertex );
		let mut doomed = self.graph.edges_directed( node, Direction::Incoming )
			.map(| edge | ( edge.id(), edge.weight().sequence, self.connection( edge.source(), edge.target(), edge.weight() )))
			.filter(|( _, _, connection )| predicate( connection ))
			.collect::<Vec<_>>();
		doomed.sort_by_key(|( _, sequence, _ )| *sequence );
		doomed.into_iter()
			.map(|( edge, _, connection )| { self.graph.remove_edge( edge ); connection })
			.collect()
	}

	/// Edges into `vertex` (its imports), in the order they were added.
	///
	/// # Panics
	/// Panics if the vertex isn't in the graph.
	pub fn in_edges( &self, vertex: &V ) -> Vec<Connection<V, I, E>> {
		self.edges( vertex, Direction::Incoming )
	}

	/// Edges out of `vertex` (to its dependents), in the order they were added.
	///
	/// # Panics
	/// Panics if the vertex isn't in the graph.
	pub fn out_edges( &self, vertex: &V ) -> Vec<Connection<V, I, E>> {
		self.edges( vertex, Direction::Outgoing )
	}

	/// Orders the vertices of `subset` so that every edge source precedes its target.
	///
	/// Only edges with both endpoints in `subset` are considered; vertices of `subset`
	/// that aren't in the graph are ignored.
	///
	/// # Errors
	/// Returns [`GraphError::CycleDetected`] if the subset contains a cycle.
	pub fn topological_sort<'a>( &self, subset: impl IntoIterator<Item = &'a V> ) -> Result<Vec<V>, GraphError<V>>
	where
		V: 'a,
	{
		let nodes = subset.into_iter()
			.filter_map(| vertex | self.index.get( vertex ).copied() )
			.collect::<HashSet<_>>();
		let filtered = NodeFiltered::from_fn( &self.graph, | node | nodes.contains( &node ));
		match toposort( &filtered, None ) {
			Ok( order ) => Ok( order.into_iter().map(| node | self.graph[node].clone() ).collect() ),
			Err( cycle ) => Err( GraphError::CycleDetected( self.graph[cycle.node_id()].clone() )),
		}
	}

	fn edges( &self, vertex: &V, direction: Direction ) -> Vec<Connection<V, I, E>> {
		let node = self.node( vertex );
		let mut edges = self.graph.edges_directed( node, direction )
			.map(| edge | ( edge.weight().sequence, self.connection( edge.source(), edge.target(), edge.weight() )))
			.collect::<Vec<_>>();
		edges.sort_by_key(|( sequence, _ )| *sequence );
		edges.into_iter().map(|( _, connection )| connection ).collect()
	}

	fn connection( &self, source: NodeIndex, target: NodeIndex, data: &EdgeData<I, E> ) -> Connection<V, I, E> {
		Connection {
			importer: self.graph[target].clone(),
			import: data.import.clone(),
			exporter: self.graph[source].clone(),
			export: data.export.clone(),
		}
	}

	fn node( &self, vertex: &V ) -> NodeIndex {
		match self.index.get( vertex ) {
			Some( node ) => *node,
			None => panic!( "Vertex {:?} is not in the connection graph", vertex ),
		}
	}
}
