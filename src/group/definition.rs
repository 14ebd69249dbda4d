use std::collections::{ HashMap, HashSet };
use std::sync::Arc ;
use nonempty_collections::NEVec ;
use thiserror::Error ;
use tracing::warn ;

use crate::definition::{ PartDefinition, ImportId, ExportId, string_id };
use crate::graph::Connection ;
use crate::utils::{ PartialSuccess, non_empty };



string_id! {
	/// Key of a part within its [`GroupDefinition`].
	PartKey
}

string_id! {
	/// Id of an import a group exposes to other groups.
	GroupImportId
}

string_id! {
	/// Id of an export a group exposes to other groups.
	GroupExportId
}

/// A connection between two parts of the same group.
pub type InternalConnection = Connection<PartKey, ImportId, ExportId>;

/// A registration that could not be added to a group definition.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
pub enum GroupDefinitionError {

	#[error( "Part key '{0}' is used more than once" )]
	DuplicatePart( PartKey ),

	#[error( "Unknown part key '{0}'" )]
	UnknownPart( PartKey ),

	#[error( "Part '{part}' has no import '{import}'" )]
	UnknownImport { part: PartKey, import: ImportId },

	#[error( "Part '{part}' has no export '{export}'" )]
	UnknownExport { part: PartKey, export: ExportId },

	#[error( "Group import '{0}' is declared more than once" )]
	DuplicateGroupImport( GroupImportId ),

	#[error( "Group export '{0}' is declared more than once" )]
	DuplicateGroupExport( GroupExportId ),

	#[error( "Group import '{0}' has no valid part import behind it" )]
	EmptyGroupImport( GroupImportId ),

	#[error( "Group export '{0}' has no valid part export behind it" )]
	EmptyGroupExport( GroupExportId ),

}

/// A set of parts added, connected and removed as one unit.
///
/// Group imports and exports fan out to imports and exports of the member parts; when
/// two groups are connected, every part import behind the group import is matched by
/// contract against the part exports behind the group export.
#[derive( Debug, Clone )]
pub struct GroupDefinition {
	parts: Vec<( PartKey, Arc<PartDefinition> )>,
	connections: Vec<InternalConnection>,
	imports: Vec<( GroupImportId, NEVec<( PartKey, ImportId )> )>,
	exports: Vec<( GroupExportId, NEVec<( PartKey, ExportId )> )>,
}

impl GroupDefinition {

	#[inline]
	pub fn builder() -> GroupDefinitionBuilder {
		GroupDefinitionBuilder { parts: Vec::new(), connections: Vec::new(), imports: Vec::new(), exports: Vec::new() }
	}

	/// Member parts, in registration order.
	#[inline] pub fn parts( &self ) -> &[( PartKey, Arc<PartDefinition> )] { &self.parts }

	pub fn part( &self, key: &PartKey ) -> Option<&Arc<PartDefinition>> {
		self.parts.iter().find(|( candidate, _ )| candidate == key ).map(|( _, definition )| definition )
	}

	/// Connections between member parts.
	#[inline] pub fn connections( &self ) -> &[InternalConnection] { &self.connections }

	pub fn imports( &self ) -> impl Iterator<Item = &GroupImportId> { self.imports.iter().map(|( id, _ )| id ) }
	pub fn exports( &self ) -> impl Iterator<Item = &GroupExportId> { self.exports.iter().map(|( id, _ )| id ) }

	/// Part imports behind a group import.
	pub fn import( &self, id: &GroupImportId ) -> Option<&NEVec<( PartKey, ImportId )>> {
		self.imports.iter().find(|( candidate, _ )| candidate == id ).map(|( _, targets )| targets )
	}

	/// Part exports behind a group export.
	pub fn export( &self, id: &GroupExportId ) -> Option<&NEVec<( PartKey, ExportId )>> {
		self.exports.iter().find(|( candidate, _ )| candidate == id ).map(|( _, targets )| targets )
	}

	#[inline] pub fn into_shared( self ) -> Arc<Self> { Arc::new( self ) }
}

#[derive( Debug, Clone )]
#[must_use = "call .build() to produce the GroupDefinition"]
pub struct GroupDefinitionBuilder {
	parts: Vec<( PartKey, Arc<PartDefinition> )>,
	connections: Vec<InternalConnection>,
	imports: Vec<( GroupImportId, Vec<( PartKey, ImportId )> )>,
	exports: Vec<( GroupExportId, Vec<( PartKey, ExportId )> )>,
}

impl GroupDefinitionBuilder {

	pub fn part( mut self, key: impl Into<PartKey>, definition: Arc<PartDefinition> ) -> Self {
		self.parts.push(( key.into(), definition ));
		self
	}

	/// Connects `import` of part `importer` to `export` of part `exporter`.
	pub fn connect(
		mut self,
		importer: impl Into<PartKey>,
		import: impl Into<ImportId>,
		exporter: impl Into<PartKey>,
		export: impl Into<ExportId>,
	) -> Self {
		self.connections.push( Connection {
			importer: importer.into(),
			import: import.into(),
			exporter: exporter.into(),
			export: export.into(),
		});
		self
	}

	/// Exposes part imports as one group import.
	pub fn import<K: Into<PartKey>, I: Into<ImportId>>(
		mut self,
		id: impl Into<GroupImportId>,
		targets: impl IntoIterator<Item = ( K, I )>,
	) -> Self {
		let targets = targets.into_iter().map(|( key, import )| ( key.into(), import.into() )).collect();
		self.imports.push(( id.into(), targets ));
		self
	}

	/// Exposes part exports as one group export.
	pub fn export<K: Into<PartKey>, E: Into<ExportId>>(
		mut self,
		id: impl Into<GroupExportId>,
		targets: impl IntoIterator<Item = ( K, E )>,
	) -> Self {
		let targets = targets.into_iter().map(|( key, export )| ( key.into(), export.into() )).collect();
		self.exports.push(( id.into(), targets ));
		self
	}

	/// Validates the registrations and builds the definition.
	///
	/// # Partial Success
	/// Invalid registrations are logged, left out and returned alongside the definition:
	/// - a part key used twice (the first registration wins)
	/// - a connection or group import/export target naming an unknown part, import or export
	/// - a group import or export id declared twice
	/// - a group import or export left with no valid target
	pub fn build( self ) -> PartialSuccess<GroupDefinition, GroupDefinitionError> {

		let Self { parts, connections, imports, exports } = self ;
		let mut errors = Vec::new();
		let mut reject = | error: GroupDefinitionError | {
			warn!( %error, "excluding group registration" );
			errors.push( error );
		};

		let mut seen = HashSet::new();
		let parts = parts.into_iter()
			.filter(|( key, _ )| match seen.insert( key.clone() ) {
				true => true,
				false => { reject( GroupDefinitionError::DuplicatePart( key.clone() )); false },
			})
			.collect::<Vec<_>>();
		let lookup = parts.iter().map(|( key, definition )| ( key, definition )).collect::<HashMap<_, _>>();

		let check_import = | key: &PartKey, import: &ImportId | match lookup.get( key ) {
			None => Err( GroupDefinitionError::UnknownPart( key.clone() )),
			Some( definition ) if definition.import( import ).is_none() => Err( GroupDefinitionError::UnknownImport { part: key.clone(), import: import.clone() }),
			Some( _ ) => Ok(()),
		};
		let check_export = | key: &PartKey, export: &ExportId | match lookup.get( key ) {
			None => Err( GroupDefinitionError::UnknownPart( key.clone() )),
			Some( definition ) if definition.export( export ).is_none() => Err( GroupDefinitionError::UnknownExport { part: key.clone(), export: export.clone() }),
			Some( _ ) => Ok(()),
		};

		let connections = connections.into_iter()
			.filter(| connection | match check_import( &connection.importer, &connection.import )
				.and_then(|()| check_export( &connection.exporter, &connection.export ))
			{
				Ok(()) => true,
				Err( error ) => { reject( error ); false },
			})
			.collect::<Vec<_>>();

		let mut seen_imports = HashSet::new();
		let imports = imports.into_iter()
			.filter_map(|( id, targets )| {
				if !seen_imports.insert( id.clone() ) {
					reject( GroupDefinitionError::DuplicateGroupImport( id ));
					return None
				}
				let targets = targets.into_iter().filter(|( key, import )| match check_import( key, import ) {
					Ok(()) => true,
					Err( error ) => { reject( error ); false },
				});
				match non_empty( targets.collect::<Vec<_>>() ) {
					Some( targets ) => Some(( id, targets )),
					None => { reject( GroupDefinitionError::EmptyGroupImport( id )); None },
				}
			})
			.collect::<Vec<_>>();

		let mut seen_exports = HashSet::new();
		let exports = exports.into_iter()
			.filter_map(|( id, targets )| {
				if !seen_exports.insert( id.clone() ) {
					reject( GroupDefinitionError::DuplicateGroupExport( id ));
					return None
				}
				let targets = targets.into_iter().filter(|( key, export )| match check_export( key, export ) {
					Ok(()) => true,
					Err( error ) => { reject( error ); false },
				});
				match non_empty( targets.collect::<Vec<_>>() ) {
					Some( targets ) => Some(( id, targets )),
					None => { reject( GroupDefinitionError::EmptyGroupExport( id )); None },
				}
			})
			.collect::<Vec<_>>();

		( GroupDefinition { parts, connections, imports, exports }, errors )

	}
}
