use part_link::{ GroupDefinition, GroupDefinitionError, PartKey, GroupExportId };
use crate::test_groups::{ db, cache };

#[test]
fn group_definition_rejects_invalid() {

	let ( definition, errors ) = GroupDefinition::builder()
		.part( "db", db() )
		.part( "cache", cache() )
		.part( "db", cache() )
		.connect( "cache", "db", "db", "value" )
		.connect( "cache", "db", "ghost", "value" )
		.connect( "cache", "nope", "db", "value" )
		.import( "in", [( "cache", "db" )])
		.import( "in", [( "cache", "db" )])
		.export( "out", [( "db", "nope" )])
		.build();

	assert_eq!( errors, vec![
		GroupDefinitionError::DuplicatePart( PartKey::new( "db" )),
		GroupDefinitionError::UnknownPart( PartKey::new( "ghost" )),
		GroupDefinitionError::UnknownImport { part: PartKey::new( "cache" ), import: "nope".into() },
		GroupDefinitionError::DuplicateGroupImport( "in".into() ),
		GroupDefinitionError::UnknownExport { part: PartKey::new( "db" ), export: "nope".into() },
		GroupDefinitionError::EmptyGroupExport( GroupExportId::new( "out" )),
	]);

	// Valid registrations survive; the first `db` wins.
	assert_eq!( definition.parts().len(), 2 );
	assert_eq!( definition.part( &PartKey::new( "db" )).map(| part | part.id().as_str() ), Some( "db" ));
	assert_eq!( definition.connections().len(), 1 );
	assert_eq!( definition.imports().count(), 1 );
	assert_eq!( definition.exports().count(), 0 );

}
