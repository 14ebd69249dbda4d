//! A composition engine for plug-in parts.
//!
//! Parts are units of host code with declared **imports** (what they need) and
//! **exports** (what they provide). `part_link` connects them into a live dependency
//! graph and keeps the objects behind that graph in line with it: a part is built as
//! soon as its prerequisites are satisfied, rebuilt when a constructor dependency
//! changes, updated in place when a property dependency changes, and torn down when a
//! prerequisite goes away. Every change is pushed through to the dependents, providers
//! first.
//!
//! # Core Concepts
//!
//! - [`PartDefinition`]: The immutable description of a part type: its
//! 	[`ImportDefinition`]s and [`ExportDefinition`]s. Produced by whatever scans your
//! 	plugins; `part_link` never loads code itself.
//!
//! - [`Part`] and [`PartFactory`]: The contract with the host. The factory builds an
//! 	object from a definition and its resolved constructor arguments; the object
//! 	evaluates exports, accepts property imports and is disposed of when released.
//!
//! - [`InstanceEngine`]: Owns part instances and the connections between them.
//! 	Decides when objects are built, rebuilt, updated or removed and reports every
//! 	change as an [`InstanceUpdate`].
//!
//! - [`GroupLayer`]: Groups of parts added, connected and removed as a unit. Group
//! 	imports and exports fan out to the parts inside, matched by contract.
//!
//! - [`Composition`]: The thread-safe entry point. Wraps a [`GroupLayer`] in a lock and
//! 	tracks which plugin ([`Origin`]) every definition came from.
//!
//! - **Imports** carry a [`Cardinality`]:
//! 	- [`Cardinality::ExactlyOne`] - a single export, delivered as [`ImportValue::One`]
//! 	- [`Cardinality::ZeroOrOne`] - an optional export, [`ImportValue::One`] or [`ImportValue::Unset`]
//! 	- [`Cardinality::Many`] - every connected export, as [`ImportValue::Many`]
//!
//! 	and an [`ImportShape`] deciding whether each export arrives as a value, a
//! 	[`LazyExport`], an [`ExportFactory`] or a [`BoundMethod`].
//!
//! # Example
//!
//! ```
//! use std::any::Any ;
//! use std::sync::Arc ;
//! use part_link::{
//! 	Part, PartError, PartDefinition, ImportDefinition, ExportDefinition, ExportKind,
//! 	ConstructorArguments, InstanceEngine, InstanceChange, ImportConnection, ImportId, Value,
//! };
//!
//! struct Name ;
//! impl Part for Name {
//! 	fn export( &self, _: &ExportDefinition, _: &[Value] ) -> Result<Value, PartError> {
//! 		Ok( Arc::new( "world".to_string() ))
//! 	}
//! 	fn as_any( &self ) -> &dyn Any { self }
//! }
//!
//! struct Greeter { name: String }
//! impl Part for Greeter {
//! 	fn export( &self, _: &ExportDefinition, _: &[Value] ) -> Result<Value, PartError> {
//! 		Ok( Arc::new( format!( "hello {}", self.name )))
//! 	}
//! 	fn as_any( &self ) -> &dyn Any { self }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Definitions normally come from a scanner. Invalid registrations are returned
//! // alongside the definition rather than failing it.
//! let ( name, _ ) = PartDefinition::builder( "name" )
//! 	.export( ExportDefinition::new( "value", "name", ExportKind::Property ))
//! 	.build();
//! let ( greeter, _ ) = PartDefinition::builder( "greeter" )
//! 	.import( ImportDefinition::constructor( "name", 0, "name" ))
//! 	.export( ExportDefinition::new( "greeting", "greeting", ExportKind::Property ))
//! 	.build();
//!
//! // The factory is the only place objects are created.
//! let mut engine = InstanceEngine::new(
//! 	| definition: &PartDefinition, mut arguments: ConstructorArguments | -> Result<Box<dyn Part>, PartError> {
//! 		match definition.id().as_str() {
//! 			"name" => Ok( Box::new( Name )),
//! 			"greeter" => {
//! 				let name = arguments.take( &ImportId::new( "name" ))
//! 					.and_then(| value | value.one().and_then(| name | name.downcast_ref::<String>() ).cloned() )
//! 					.ok_or( "greeter needs a name" )?;
//! 				Ok( Box::new( Greeter { name }))
//! 			},
//! 			other => Err( format!( "unknown part {}", other ).into() ),
//! 		}
//! 	},
//! );
//!
//! let ( name, _ ) = engine.construct( name.into_shared(), vec![] ).map_err(|( error, _ )| error )?;
//! let ( greeter, _ ) = engine.construct(
//! 	greeter.into_shared(),
//! 	vec![ ImportConnection::new( "name", name, "value" )],
//! ).map_err(|( error, _ )| error )?;
//!
//! let object = engine.object( greeter ).ok_or( "greeter is not live" )?;
//! assert_eq!( object.with(| greeter: &Greeter | greeter.name.clone() ).as_deref(), Some( "world" ));
//!
//! // Releasing the provider takes the dependent down first.
//! let ( updates, _ ) = engine.release( name ).map_err(|( error, _ )| error )?;
//! assert_eq!( updates.len(), 2 );
//! assert_eq!( updates[0].instance, greeter );
//! assert_eq!( updates[0].change, InstanceChange::Removed );
//! # Ok(())
//! # }
//! ```
//!
//! # Partial Success
//!
//! Operations that cascade don't stop at the first failing part. They return
//! [`PartialResult`]: either the result together with the failures collected on the
//! way, or the primary error together with those that led to it. How a failing
//! dependent affects the rest of a cascade is set with
//! [`InstanceEngine::with_failure_policy`].
//!
//! # Logging
//!
//! Decisions are logged through `tracing`: `debug` for each build, update and removal,
//! `warn` for failures and excluded registrations, `info` for group and plugin level
//! changes. `part_link` never installs a subscriber.

mod utils ;
mod definition ;
pub mod cardinality ;
mod part ;
pub mod graph ;
pub mod satisfaction ;
mod lifecycle ;
mod part_layer ;
pub mod group ;
mod composition ;

#[doc( no_inline )]
pub use nonempty_collections::NEVec ;

pub use utils::{ PartialSuccess, PartialResult };
pub use definition::{
	PartTypeId, ImportId, ExportId, ContractName, MethodSignature,
	ImportKind, ImportShape, ImportDefinition, ExportKind, ExportDefinition,
	PartDefinition, PartDefinitionBuilder, DefinitionError,
};
pub use cardinality::{ Cardinality, ImportValue, Resolved };
pub use part::{ Part, PartFactory, PartHandle, ConstructorArguments, Value, PartError };
pub use graph::{ ConnectionGraph, Connection, GraphError };
pub use lifecycle::{
	InstanceEngine, PartInstanceId, ImportConnection, InstanceChange, InstanceUpdate, FailurePolicy,
	ConstructionError, ComposeError, LazyExport, ExportFactory, BoundMethod, ExportError,
};
pub use part_layer::{ PartLayer, PartCompositionId, PartConnection, PartCompositionError };
pub use group::{
	GroupLayer, GroupId, GroupConnection, GroupError, GroupDefinition, GroupDefinitionBuilder,
	GroupDefinitionError, GroupImportId, GroupExportId, PartKey, InternalConnection,
};
pub use composition::{ Composition, CompositionError, Origin };
