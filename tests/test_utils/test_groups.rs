#[allow( dead_code )]
mod test_groups {

	use std::sync::Arc ;
	use part_link::{ GroupDefinition, GroupConnection, GroupId, ImportDefinition, PartDefinition, Connection };
	use crate::test_parts::{ definition, export, provider };

	pub fn db() -> Arc<PartDefinition> { provider( "db", "Db" ) }

	pub fn cache() -> Arc<PartDefinition> {
		definition( "cache", vec![ ImportDefinition::constructor( "db", 0, "Db" )], vec![ export( "value", "Cache" )])
	}

	/// Requires a `Cache`, optionally takes a `Log`.
	pub fn handler() -> Arc<PartDefinition> {
		definition( "handler", vec![
			ImportDefinition::constructor( "cache", 0, "Cache" ),
			ImportDefinition::property( "log", "log", "Log" ),
		], vec![ export( "value", "Handler" )])
	}

	/// `db` feeding `cache`, exporting both.
	pub fn storage() -> Arc<GroupDefinition> {
		let ( definition, errors ) = GroupDefinition::builder()
			.part( "db", db() )
			.part( "cache", cache() )
			.connect( "cache", "db", "db", "value" )
			.export( "cache", [( "cache", "value" )])
			.export( "db", [( "db", "value" )])
			.build();
		assert_no_errors!( errors );
		definition.into_shared()
	}

	/// A lone `handler` whose imports are exposed as `backend`.
	pub fn web() -> Arc<GroupDefinition> {
		let ( definition, errors ) = GroupDefinition::builder()
			.part( "handler", handler() )
			.import( "backend", [( "handler", "cache" ), ( "handler", "log" )])
			.build();
		assert_no_errors!( errors );
		definition.into_shared()
	}

	pub fn connection( importer: GroupId, import: &str, exporter: GroupId, export: &str ) -> GroupConnection {
		Connection { importer, import: import.into(), exporter, export: export.into() }
	}
}
