use part_link::{ GroupLayer, GroupId, GroupImportId, ImportConnection, InstanceUpdate, InstanceChange, PartKey };
use crate::test_parts::{ TestFactory, inspect };
use crate::test_groups::{ storage, web, connection };

#[test]
fn group_connect_matches_by_contract() {

	let factory = TestFactory::new();
	let mut groups = GroupLayer::new( factory.engine() );
	let ( backend, frontend ) = ( GroupId::new(), GroupId::new() );

	// Without its backend the handler waits.
	let ( updates, errors ) = groups.add( frontend, web() ).unwrap();
	assert_no_errors!( errors );
	assert!( updates.is_empty() );
	match groups.parts( frontend ).unwrap().as_slice() {
		[( key, None )] if key.as_str() == "handler" => {}
		value => panic!( "Expected an uninstantiated handler, found: {:#?}", value ),
	}
	assert_eq!( groups.unsatisfied_imports( frontend ).unwrap(), vec![ GroupImportId::new( "backend" )]);

	groups.add( backend, storage() ).unwrap();
	let cache = groups.parts( backend ).unwrap()[1].1.unwrap();

	let ( updates, errors ) = groups.connect( connection( frontend, "backend", backend, "cache" )).unwrap();
	assert_no_errors!( errors );
	let handler = match updates.as_slice() {
		[ InstanceUpdate { instance, change: InstanceChange::Reconstructed }] => *instance,
		value => panic!( "Expected the handler to be built, found: {:#?}", value ),
	};

	// Only the import whose contract matches the export is connected.
	assert_eq!( groups.engine().connections( handler ), vec![ ImportConnection::new( "cache", cache, "value" )]);
	let object = groups.object( frontend, &PartKey::new( "handler" )).unwrap();
	assert_eq!( inspect( object, | part | part.argument( "cache" )), vec![ "cache.value#1" ]);
	assert_eq!( inspect( object, | part | part.property( "log" )), Some( vec![] ));

	assert_eq!( groups.satisfied_imports( frontend ).unwrap(), vec![ GroupImportId::new( "backend" )]);
	assert!( groups.unsatisfied_imports( frontend ).unwrap().is_empty() );
	assert_eq!( groups.connections( frontend ), vec![ connection( frontend, "backend", backend, "cache" )]);

}
