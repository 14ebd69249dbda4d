//! Part definition types.
//!
//! A [`PartDefinition`] is the immutable description of a part type as produced by
//! whatever scanned it: the imports it needs satisfied (its dependencies) and the
//! exports it makes available to other parts. Many part instances may share a single
//! definition, so the composition layers hand it around behind an `Arc`.

use std::collections::HashMap ;
use std::sync::Arc ;
use thiserror::Error ;
use tracing::warn ;

use crate::cardinality::Cardinality ;
use crate::utils::PartialSuccess ;



macro_rules! string_id {
	( $( #[$meta:meta] )* $name:ident ) => {
		$( #[$meta] )*
		#[derive( Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd )]
		pub struct $name( String );

		impl $name {
			/// Wraps the given string as an identifier.
			#[inline] pub fn new( id: impl Into<String> ) -> Self { Self( id.into() ) }
			/// The identifier as a string slice.
			#[inline] pub fn as_str( &self ) -> &str { &self.0 }
		}

		impl std::fmt::Display for $name {
			fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.0 )}
		}

		impl From<&str> for $name {
			fn from( id: &str ) -> Self { Self( id.to_string() )}
		}

		impl From<String> for $name {
			fn from( id: String ) -> Self { Self( id )}
		}
	};
}
pub(crate) use string_id ;

string_id! {
	/// Opaque identity of a part type, shared by every instance built from it.
	PartTypeId
}

string_id! {
	/// Registration id of an import, unique within its [`PartDefinition`].
	ImportId
}

string_id! {
	/// Registration id of an export, unique within its [`PartDefinition`].
	ExportId
}

string_id! {
	/// Name of the contract an export provides and an import requires.
	ContractName
}

/// Signature of an exported method, or of the delegate an import expects.
#[derive( Clone, Debug, Eq, PartialEq, Hash, Default )]
pub struct MethodSignature {
	parameters: Vec<ContractName>,
	returns: Option<ContractName>,
}

impl MethodSignature {
	/// Creates a signature from its parameter contracts and optional return contract.
	pub fn new(
		parameters: impl IntoIterator<Item = impl Into<ContractName>>,
		returns: Option<ContractName>,
	) -> Self {
		Self { parameters: parameters.into_iter().map( Into::into ).collect(), returns }
	}

	/// Parameter contracts, in order.
	#[inline] pub fn parameters( &self ) -> &[ContractName] { &self.parameters }

	/// Return contract, if the method returns a value.
	#[inline] pub fn returns( &self ) -> Option<&ContractName> { self.returns.as_ref() }
}

/// How an import is injected into its owning part.
#[derive( Clone, Debug, Eq, PartialEq, Hash )]
pub enum ImportKind {
	/// Passed to the part's constructor at the given parameter position.
	/// Changing it always requires the object to be rebuilt.
	Constructor { parameter: usize },
	/// Assigned to the named property after construction.
	Property { name: String },
}

/// The value shape an import expects for each connected export.
#[derive( Clone, Debug, Eq, PartialEq, Hash, Default )]
pub enum ImportShape {
	/// The exported value itself, evaluated when the import is resolved.
	#[default] Direct,
	/// An accessor that evaluates the export on first use and caches it.
	Lazy,
	/// An accessor that evaluates the export anew on every call.
	Factory,
	/// A callable bound to an exported method with exactly this signature.
	Delegate( MethodSignature ),
}

/// Describes a single import of a part.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct ImportDefinition {
	id: ImportId,
	kind: ImportKind,
	contract: ContractName,
	cardinality: Cardinality,
	shape: ImportShape,
	is_prerequisite: bool,
	is_recomposable: bool,
}

impl ImportDefinition {

	/// A constructor import: required, singular and never recomposable.
	pub fn constructor(
		id: impl Into<ImportId>,
		parameter: usize,
		contract: impl Into<ContractName>,
	) -> Self {
		Self {
			id: id.into(),
			kind: ImportKind::Constructor { parameter },
			contract: contract.into(),
			cardinality: Cardinality::ExactlyOne,
			shape: ImportShape::Direct,
			is_prerequisite: true,
			is_recomposable: false,
		}
	}

	/// A property import: optional, singular and recomposable.
	pub fn property(
		id: impl Into<ImportId>,
		name: impl Into<String>,
		contract: impl Into<ContractName>,
	) -> Self {
		Self {
			id: id.into(),
			kind: ImportKind::Property { name: name.into() },
			contract: contract.into(),
			cardinality: Cardinality::ZeroOrOne,
			shape: ImportShape::Direct,
			is_prerequisite: false,
			is_recomposable: true,
		}
	}

	/// Sets how many exports may be connected to this import.
	pub fn with_cardinality( mut self, cardinality: Cardinality ) -> Self {
		self.cardinality = cardinality ;
		self
	}

	/// Sets the value shape delivered for each connected export.
	pub fn with_shape( mut self, shape: ImportShape ) -> Self {
		self.shape = shape ;
		self
	}

	/// Marks whether the import must be satisfied before the part can exist.
	pub fn prerequisite( mut self, is_prerequisite: bool ) -> Self {
		self.is_prerequisite = is_prerequisite ;
		self
	}

	/// Marks whether the import may change without rebuilding the part.
	///
	/// Constructor imports can't be recomposable; [`PartDefinitionBuilder::build`]
	/// rejects them.
	pub fn recomposable( mut self, is_recomposable: bool ) -> Self {
		self.is_recomposable = is_recomposable ;
		self
	}

	#[inline] pub fn id( &self ) -> &ImportId { &self.id }
	#[inline] pub fn kind( &self ) -> &ImportKind { &self.kind }
	#[inline] pub fn contract( &self ) -> &ContractName { &self.contract }
	#[inline] pub fn cardinality( &self ) -> Cardinality { self.cardinality }
	#[inline] pub fn shape( &self ) -> &ImportShape { &self.shape }
	#[inline] pub fn is_prerequisite( &self ) -> bool { self.is_prerequisite }
	#[inline] pub fn is_recomposable( &self ) -> bool { self.is_recomposable }

	/// Whether the import is injected through the constructor.
	#[inline] pub fn is_constructor( &self ) -> bool { matches!( self.kind, ImportKind::Constructor { .. })}

	/// Constructor parameter position, for constructor imports.
	#[inline]
	pub fn parameter( &self ) -> Option<usize> {
		match self.kind {
			ImportKind::Constructor { parameter } => Some( parameter ),
			ImportKind::Property { .. } => None,
		}
	}
}

/// How an exported value is produced from a live instance.
#[derive( Clone, Debug, Eq, PartialEq, Hash )]
pub enum ExportKind {
	/// A method of the instance. Delegate imports with a matching signature bind to it.
	Method( MethodSignature ),
	/// A property getter of the instance.
	Property,
	/// The instance itself.
	Type,
}

/// Describes a single export of a part.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct ExportDefinition {
	id: ExportId,
	contract: ContractName,
	kind: ExportKind,
}

impl ExportDefinition {
	/// Creates an export definition.
	#[inline]
	pub fn new( id: impl Into<ExportId>, contract: impl Into<ContractName>, kind: ExportKind ) -> Self {
		Self { id: id.into(), contract: contract.into(), kind }
	}

	#[inline] pub fn id( &self ) -> &ExportId { &self.id }
	#[inline] pub fn contract( &self ) -> &ContractName { &self.contract }
	#[inline] pub fn kind( &self ) -> &ExportKind { &self.kind }
}

/// A registration that could not be added to a definition.
///
/// The offending import or export is left out of the definition; the rest of the
/// definition is still usable.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
pub enum DefinitionError {
	/// Two imports share the same registration id.
	#[error( "Duplicate import '{import}' on part '{part}'" )]
	DuplicateImport { part: PartTypeId, import: ImportId },
	/// Two exports share the same registration id.
	#[error( "Duplicate export '{export}' on part '{part}'" )]
	DuplicateExport { part: PartTypeId, export: ExportId },
	/// A constructor import was marked recomposable.
	#[error( "Constructor import '{import}' on part '{part}' cannot be recomposable" )]
	RecomposableConstructorImport { part: PartTypeId, import: ImportId },
	/// Two constructor imports claim the same parameter position.
	#[error( "Constructor parameter {parameter} of part '{part}' is claimed by more than one import ('{import}')" )]
	DuplicateParameter { part: PartTypeId, import: ImportId, parameter: usize },
}

/// Immutable description of a part type.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct PartDefinition {
	id: PartTypeId,
	imports: Vec<ImportDefinition>,
	exports: Vec<ExportDefinition>,
	import_index: HashMap<ImportId, usize>,
	export_index: HashMap<ExportId, usize>,
}

impl PartDefinition {

	/// Starts building a definition for the given part type.
	#[inline]
	pub fn builder( id: impl Into<PartTypeId> ) -> PartDefinitionBuilder {
		PartDefinitionBuilder { id: id.into(), imports: Vec::new(), exports: Vec::new() }
	}

	#[inline] pub fn id( &self ) -> &PartTypeId { &self.id }

	/// Registered imports, in registration order.
	#[inline] pub fn imports( &self ) -> &[ImportDefinition] { &self.imports }

	/// Registered exports, in registration order.
	#[inline] pub fn exports( &self ) -> &[ExportDefinition] { &self.exports }

	#[inline]
	pub fn import( &self, id: &ImportId ) -> Option<&ImportDefinition> {
		self.import_index.get( id ).map(| index | &self.imports[*index] )
	}

	#[inline]
	pub fn export( &self, id: &ExportId ) -> Option<&ExportDefinition> {
		self.export_index.get( id ).map(| index | &self.exports[*index] )
	}

	/// Imports that must be satisfied for the part to exist.
	pub fn prerequisite_imports( &self ) -> impl Iterator<Item = &ImportDefinition> {
		self.imports.iter().filter(| import | import.is_prerequisite() )
	}

	/// Constructor imports ordered by parameter position.
	pub fn constructor_imports( &self ) -> Vec<&ImportDefinition> {
		let mut imports = self.imports.iter()
			.filter(| import | import.is_constructor() )
			.collect::<Vec<_>>();
		imports.sort_by_key(| import | import.parameter() );
		imports
	}

	/// Imports assigned after construction.
	pub fn property_imports( &self ) -> impl Iterator<Item = &ImportDefinition> {
		self.imports.iter().filter(| import | !import.is_constructor() )
	}

	/// Wraps the definition for sharing between instances.
	#[inline] pub fn into_shared( self ) -> Arc<Self> { Arc::new( self ) }
}

/// Collects imports and exports for a [`PartDefinition`].
#[derive( Debug, Clone )]
#[must_use = "call .build() to produce the PartDefinition"]
pub struct PartDefinitionBuilder {
	id: PartTypeId,
	imports: Vec<ImportDefinition>,
	exports: Vec<ExportDefinition>,
}

impl PartDefinitionBuilder {

	/// Registers an import.
	pub fn import( mut self, import: ImportDefinition ) -> Self {
		self.imports.push( import );
		self
	}

	/// Registers an export.
	pub fn export( mut self, export: ExportDefinition ) -> Self {
		self.exports.push( export );
		self
	}

	/// Validates the registrations and builds the definition.
	///
	/// # Partial Success
	/// Registrations that can't be processed are logged, left out of the definition,
	/// and returned alongside it:
	/// - an import or export id registered twice (the first registration wins)
	/// - a recomposable constructor import
	/// - two constructor imports on the same parameter position
	pub fn build( self ) -> PartialSuccess<PartDefinition, DefinitionError> {

		let Self { id, imports, exports } = self ;
		let mut errors = Vec::new();

		let mut import_index = HashMap::with_capacity( imports.len() );
		let mut parameters = HashMap::new();
		let mut kept_imports = Vec::with_capacity( imports.len() );
		for import in imports {
			let error = if import_index.contains_key( import.id() ) {
				Some( DefinitionError::DuplicateImport { part: id.clone(), import: import.id().clone() })
			} else if import.is_constructor() && import.is_recomposable() {
				Some( DefinitionError::RecomposableConstructorImport { part: id.clone(), import: import.id().clone() })
			} else {
				match import.parameter() {
					Some( parameter ) if parameters.contains_key( &parameter ) => Some( DefinitionError::DuplicateParameter {
						part: id.clone(),
						import: import.id().clone(),
						parameter,
					}),
					_ => None,
				}
			};
			match error {
				Some( error ) => {
					warn!( part = %id, %error, "excluding import registration" );
					errors.push( error );
				},
				None => {
					if let Some( parameter ) = import.parameter() { parameters.insert( parameter, import.id().clone() ); }
					import_index.insert( import.id().clone(), kept_imports.len() );
					kept_imports.push( import );
				},
			}
		}

		let mut export_index = HashMap::with_capacity( exports.len() );
		let mut kept_exports = Vec::with_capacity( exports.len() );
		for export in exports {
			if export_index.contains_key( export.id() ) {
				let error = DefinitionError::DuplicateExport { part: id.clone(), export: export.id().clone() };
				warn!( part = %id, %error, "excluding export registration" );
				errors.push( error );
			} else {
				export_index.insert( export.id().clone(), kept_exports.len() );
				kept_exports.push( export );
			}
		}

		( PartDefinition { id, imports: kept_imports, exports: kept_exports, import_index, export_index }, errors )

	}
}
