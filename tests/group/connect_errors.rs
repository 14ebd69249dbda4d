use part_link::{ GroupLayer, GroupId, GroupError };
use crate::test_parts::TestFactory ;
use crate::test_groups::{ storage, web, connection };

#[test]
fn group_connect_errors() {

	let factory = TestFactory::new();
	let mut groups = GroupLayer::new( factory.engine() );
	let ( backend, frontend, missing ) = ( GroupId::new(), GroupId::new(), GroupId::new() );
	groups.add( backend, storage() ).unwrap();
	groups.add( frontend, web() ).unwrap();

	match groups.connect( connection( frontend, "backend", backend, "db" )) {
		Err(( GroupError::NoMatchingExport { import, export }, _ )) if import.as_str() == "backend" && export.as_str() == "db" => {}
		value => panic!( "Expected NoMatchingExport, found: {:#?}", value ),
	}

	match groups.connect( connection( frontend, "nope", backend, "cache" )) {
		Err(( GroupError::UnknownGroupImport { group, .. }, _ )) if group == frontend => {}
		value => panic!( "Expected UnknownGroupImport, found: {:#?}", value ),
	}

	match groups.connect( connection( frontend, "backend", backend, "nope" )) {
		Err(( GroupError::UnknownGroupExport { group, .. }, _ )) if group == backend => {}
		value => panic!( "Expected UnknownGroupExport, found: {:#?}", value ),
	}

	match groups.connect( connection( frontend, "backend", missing, "cache" )) {
		Err(( GroupError::UnknownGroup( group ), _ )) if group == missing => {}
		value => panic!( "Expected UnknownGroup, found: {:#?}", value ),
	}

	match groups.satisfied_imports( missing ) {
		Err( GroupError::UnknownGroup( group )) if group == missing => {}
		value => panic!( "Expected UnknownGroup, found: {:#?}", value ),
	}

	// None of the rejected connections were recorded.
	assert!( groups.connections( frontend ).is_empty() );
	assert_eq!( factory.constructions( "handler" ), 0 );

}
