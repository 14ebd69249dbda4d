//! Group-level composition.
//!
//! A group is a set of parts added and removed as a unit. Groups are connected to each
//! other through group imports and exports, each of which fans out to several part
//! imports or exports. Every group-level operation is translated into part-level
//! connections and carried out by the [`PartLayer`], which keeps the instances in line.

mod definition ;

use std::collections::{ HashMap, HashSet };
use std::sync::Arc ;
use itertools::Itertools ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use tracing::{ debug, info, warn };
use uuid::Uuid ;

use crate::graph::{ Connection, ConnectionGraph, GraphError };
use crate::lifecycle::{ InstanceEngine, PartInstanceId, InstanceUpdate, ComposeError };
use crate::part::PartHandle ;
use crate::part_layer::{ PartLayer, PartCompositionId, PartConnection, PartCompositionError };
use crate::utils::{ PartialResult, PartialSuccess };

pub use definition::{ GroupDefinition, GroupDefinitionBuilder, GroupDefinitionError, GroupImportId, GroupExportId, PartKey, InternalConnection };



/// Identity of a group in the composition.
#[derive( Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd )]
pub struct GroupId( Uuid );

impl GroupId {
	/// A new random group id.
	#[allow( clippy::new_without_default )]
	pub fn new() -> Self { Self( Uuid::new_v4() ) }
	#[inline] pub fn as_uuid( &self ) -> &Uuid { &self.0 }
}

impl From<Uuid> for GroupId {
	fn from( id: Uuid ) -> Self { Self( id )}
}

impl std::fmt::Display for GroupId {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.0 )}
}

/// A group import of `importer` satisfied by a group export of `exporter`.
pub type GroupConnection = Connection<GroupId, GroupImportId, GroupExportId>;

#[derive( Debug, Error )]
pub enum GroupError {

	#[error( "Unknown group {0}" )]
	UnknownGroup( GroupId ),

	#[error( "Group {0} already exists" )]
	DuplicateGroup( GroupId ),

	#[error( "Group {group} has no import '{import}'" )]
	UnknownGroupImport { group: GroupId, import: GroupImportId },

	#[error( "Group {group} has no export '{export}'" )]
	UnknownGroupExport { group: GroupId, export: GroupExportId },

	#[error( "No part export behind '{export}' matches the contract of any part import behind '{import}'" )]
	NoMatchingExport { import: GroupImportId, export: GroupExportId },

	#[error( transparent )]
	Compose( ComposeError ),

	#[error( transparent )]
	Part( PartCompositionError ),

}

impl From<ComposeError> for GroupError {
	fn from( error: ComposeError ) -> Self { Self::Compose( error )}
}

impl From<PartCompositionError> for GroupError {
	fn from( error: PartCompositionError ) -> Self {
		match error {
			PartCompositionError::Compose( error ) => Self::Compose( error ),
			error => Self::Part( error ),
		}
	}
}

struct GroupRecord {
	definition: Arc<GroupDefinition>,
	parts: Vec<( PartKey, PartCompositionId )>,
}

impl GroupRecord {
	fn part( &self, key: &PartKey ) -> Option<PartCompositionId> {
		self.parts.iter().find(|( candidate, _ )| candidate == key ).map(|( _, part )| *part )
	}
}

/// Groups, the connections between them and the parts they consist of.
pub struct GroupLayer {
	parts: PartLayer,
	graph: ConnectionGraph<GroupId, GroupImportId, GroupExportId>,
	groups: HashMap<GroupId, GroupRecord>,
}

impl GroupLayer {

	pub fn new( engine: InstanceEngine ) -> Self {
		Self { parts: PartLayer::new( engine ), graph: ConnectionGraph::new(), groups: HashMap::new() }
	}

	#[inline] pub fn part_layer( &self ) -> &PartLayer { &self.parts }
	#[inline] pub fn part_layer_mut( &mut self ) -> &mut PartLayer { &mut self.parts }
	#[inline] pub fn engine( &self ) -> &InstanceEngine { self.parts.engine() }

	/// Adds a group: places its parts, applies its internal connections and
	/// instantiates every part that can be, providers first.
	///
	/// # Partial Success
	/// Parts that fail to build are reported; the group is added regardless and they are
	/// retried whenever the group's connections change.
	///
	/// # Errors
	/// Fails without changing anything if `group` already exists.
	pub fn add( &mut self, group: GroupId, definition: Arc<GroupDefinition> ) -> PartialResult<Vec<InstanceUpdate>, GroupError> {

		if self.groups.contains_key( &group ) { return Err(( GroupError::DuplicateGroup( group ), Vec::new() )) }

		let parts = definition.parts().iter()
			.map(|( key, part )| ( key.clone(), self.parts.add( Arc::clone( part ))))
			.collect::<Vec<_>>();
		let record = GroupRecord { definition: Arc::clone( &definition ), parts };

		let mut errors = Vec::new();
		for connection in definition.connections() {
			let ( Some( importer ), Some( exporter )) = ( record.part( &connection.importer ), record.part( &connection.exporter )) else { continue };
			if let Err( error ) = self.parts.connect( Connection {
				importer,
				import: connection.import.clone(),
				exporter,
				export: connection.export.clone(),
			}) { errors.push( GroupError::from( error )); }
		}

		let roots = record.parts.iter().map(|( _, part )| *part ).collect::<Vec<_>>();
		self.graph.add_vertex( group );
		self.groups.insert( group, record );
		info!( %group, parts = roots.len(), "group added" );

		let ( updates, failures ) = self.parts.sync( roots );
		errors.extend( failures.into_iter().map( GroupError::from ));
		Ok(( updates, errors ))

	}

	/// Connects a group import to a group export.
	///
	/// Every part import behind the group import is connected to every part export
	/// behind the group export that provides the same contract, and the importing parts
	/// are brought in line.
	///
	/// # Errors
	/// Fails without changing anything if either group, the import or the export is
	/// unknown, or if no part export matches any part import.
	pub fn connect( &mut self, connection: GroupConnection ) -> PartialResult<Vec<InstanceUpdate>, GroupError> {

		let part_connections = match self.part_connections( &connection ) {
			Ok( part_connections ) => part_connections,
			Err( error ) => return Err(( error, Vec::new() )),
		};
		if part_connections.is_empty() {
			return Err(( GroupError::NoMatchingExport { import: connection.import, export: connection.export }, Vec::new() ))
		}

		let mut errors = Vec::new();
		let mut importers = Vec::new();
		for part_connection in part_connections {
			let importer = part_connection.importer ;
			match self.parts.connect( part_connection ) {
				Ok(()) => importers.push( importer ),
				Err( error ) => errors.push( GroupError::from( error )),
			}
		}

		debug!( importer = %connection.importer, exporter = %connection.exporter, import = %connection.import, export = %connection.export, "groups connected" );
		self.graph.add_edge( connection );

		let ( updates, failures ) = self.parts.sync( importers.into_iter().unique() );
		errors.extend( failures.into_iter().map( GroupError::from ));
		Ok(( updates, errors ))

	}

	/// Undoes [`connect`]( Self::connect ).
	///
	/// Unknown groups, imports or exports leave nothing to disconnect and are ignored.
	pub fn disconnect( &mut self, connection: &GroupConnection ) -> PartialSuccess<Vec<InstanceUpdate>, GroupError> {

		let Ok( part_connections ) = self.part_connections( connection ) else {
			debug!( importer = %connection.importer, exporter = %connection.exporter, "nothing to disconnect" );
			return ( Vec::new(), Vec::new() )
		};

		self.graph.remove_in_edges_if( &connection.importer, | edge | edge == connection );
		let importers = part_connections.iter()
			.filter(| part_connection | self.parts.disconnect( part_connection ) > 0 )
			.map(| part_connection | part_connection.importer )
			.unique()
			.collect::<Vec<_>>();
		debug!( importer = %connection.importer, exporter = %connection.exporter, parts = importers.len(), "groups disconnected" );

		let ( updates, failures ) = self.parts.sync( importers );
		( updates, failures.into_iter().map( GroupError::from ).collect() )

	}

	/// Removes a group and every one of its parts, releasing their instances.
	///
	/// Parts of other groups that depended on it are updated or removed in turn.
	///
	/// # Errors
	/// Fails if `group` is unknown.
	pub fn remove( &mut self, group: GroupId ) -> PartialResult<Vec<InstanceUpdate>, GroupError> {

		let Some( record ) = self.groups.remove( &group ) else {
			return Err(( GroupError::UnknownGroup( group ), Vec::new() ))
		};

		// Dependents first, so no part of the group is rebuilt on its way out.
		let order = record.parts.iter()
			.map(|( _, part )| *part )
			.collect::<Vec<_>>()
			.pipe(| members | match self.parts.topological_order( &members ) {
				Ok( order ) => order.into_iter().rev().collect::<Vec<_>>(),
				Err( GraphError::CycleDetected( part )) => {
					warn!( %group, %part, "group parts form a cycle, removing in declaration order" );
					members
				},
			});

		let mut updates = Vec::new();
		let mut errors = Vec::new();
		for part in order {
			match self.parts.remove( part ) {
				Ok(( removed, failures )) => {
					updates.extend( removed );
					errors.extend( failures.into_iter().map( GroupError::from ));
				},
				Err(( error, failures )) => {
					errors.push( error.into() );
					errors.extend( failures.into_iter().map( GroupError::from ));
				},
			}
		}

		self.graph.remove_vertex( &group );
		info!( %group, instances = updates.len(), "group removed" );
		Ok(( updates, errors ))

	}

	/// Every group, in no particular order.
	pub fn groups( &self ) -> impl Iterator<Item = GroupId> + '_ { self.groups.keys().copied() }

	#[inline]
	pub fn group( &self, group: GroupId ) -> Option<&Arc<GroupDefinition>> {
		self.groups.get( &group ).map(| record | &record.definition )
	}

	/// Group connections into `group`, in the order they were made.
	pub fn connections( &self, group: GroupId ) -> Vec<GroupConnection> {
		if !self.graph.contains_vertex( &group ) { return Vec::with_capacity( 0 ) }
		self.graph.in_edges( &group )
	}

	/// Group imports of `group` with at least one connection.
	///
	/// # Errors
	/// Fails if `group` is unknown.
	pub fn satisfied_imports( &self, group: GroupId ) -> Result<Vec<GroupImportId>, GroupError> {
		let ( satisfied, _ ) = self.partition_imports( group )?;
		Ok( satisfied )
	}

	/// Group imports of `group` with no connection.
	///
	/// # Errors
	/// Fails if `group` is unknown.
	pub fn unsatisfied_imports( &self, group: GroupId ) -> Result<Vec<GroupImportId>, GroupError> {
		let ( _, unsatisfied ) = self.partition_imports( group )?;
		Ok( unsatisfied )
	}

	/// The parts of `group` with the instance currently built for each.
	///
	/// # Errors
	/// Fails if `group` is unknown.
	pub fn parts( &self, group: GroupId ) -> Result<Vec<( PartKey, Option<PartInstanceId> )>, GroupError> {
		let record = self.groups.get( &group ).ok_or( GroupError::UnknownGroup( group ))?;
		Ok( record.parts.iter().map(|( key, part )| ( key.clone(), self.parts.instance( *part ))).collect() )
	}

	/// The live object of one part of `group`.
	pub fn object( &self, group: GroupId, key: &PartKey ) -> Option<&PartHandle> {
		let part = self.groups.get( &group )?.part( key )?;
		self.parts.object( part )
	}

	fn partition_imports( &self, group: GroupId ) -> Result<( Vec<GroupImportId>, Vec<GroupImportId> ), GroupError> {
		let record = self.groups.get( &group ).ok_or( GroupError::UnknownGroup( group ))?;
		let connected = self.graph.in_edges( &group ).into_iter()
			.map(| edge | edge.import )
			.collect::<HashSet<_>>();
		Ok( record.definition.imports().cloned().partition(| import | connected.contains( import )))
	}

	/// Part-level connections implied by a group connection, matched by contract.
	fn part_connections( &self, connection: &GroupConnection ) -> Result<Vec<PartConnection>, GroupError> {

		let importer = self.groups.get( &connection.importer ).ok_or( GroupError::UnknownGroup( connection.importer ))?;
		let exporter = self.groups.get( &connection.exporter ).ok_or( GroupError::UnknownGroup( connection.exporter ))?;
		let imports = importer.definition.import( &connection.import ).ok_or_else(|| GroupError::UnknownGroupImport {
			group: connection.importer,
			import: connection.import.clone(),
		})?;
		let exports = exporter.definition.export( &connection.export ).ok_or_else(|| GroupError::UnknownGroupExport {
			group: connection.exporter,
			export: connection.export.clone(),
		})?;

		let exports = exports.clone().into_iter()
			.filter_map(|( key, export )| {
				let part = exporter.part( &key )?;
				let contract = exporter.definition.part( &key )?.export( &export )?.contract().clone();
				Some(( part, export, contract ))
			})
			.collect::<Vec<_>>();

		Ok( imports.clone().into_iter()
			.filter_map(|( key, import )| {
				let part = importer.part( &key )?;
				let contract = importer.definition.part( &key )?.import( &import )?.contract().clone();
				Some(( part, import, contract ))
			})
			.cartesian_product( exports )
			.filter(|(( _, _, wanted ), ( _, _, offered ))| wanted == offered )
			.map(|(( importer, import, _ ), ( exporter, export, _ ))| Connection { importer, import, exporter, export })
			.collect())

	}
}

impl std::fmt::Debug for GroupLayer {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "GroupLayer" )
			.field( "groups", &self.groups.len() )
			.field( "connections", &self.graph.edge_count() )
			.field( "parts", &self.parts )
			.finish()
	}
}
