use part_link::{ Composition, GroupId, Origin, PartTypeId, InstanceUpdate, InstanceChange };
use crate::test_parts::TestFactory ;
use crate::test_groups::{ storage, web, connection };

#[test]
fn composition_remove_plugins() {

	let factory = TestFactory::new();
	let composition = Composition::new( factory.clone() );
	crate::catalog( &composition );

	let ( backend, frontend ) = ( GroupId::new(), GroupId::new() );
	composition.add_group( backend, ( *storage() ).clone() ).unwrap();
	composition.add_group( frontend, ( *web() ).clone() ).unwrap();
	let ( updates, _ ) = composition.connect( connection( frontend, "backend", backend, "cache" )).unwrap();
	let handler = updates[0].instance ;

	let db = composition.definition( &PartTypeId::new( "db" )).unwrap();
	let ( standalone, errors ) = composition.construct( db, vec![] ).unwrap();
	assert_no_errors!( errors );

	let ( updates, errors ) = composition.remove_plugins([ Origin::new( "web-plugin" )]);
	assert_no_errors!( errors );
	assert_eq!( updates, vec![ InstanceUpdate { instance: handler, change: InstanceChange::Removed }]);
	assert_eq!( composition.groups(), vec![ backend ]);
	assert!( composition.definition( &PartTypeId::new( "handler" )).is_none() );
	assert!( composition.definition( &PartTypeId::new( "db" )).is_some() );

	let ( updates, errors ) = composition.remove_plugins([ Origin::new( "storage-plugin" )]);
	assert_no_errors!( errors );
	assert_eq!( updates.len(), 3 );
	assert!( updates.iter().all(| update | update.change == InstanceChange::Removed ));
	assert_eq!( updates.last().map(| update | update.instance ), Some( standalone ));

	assert!( composition.groups().is_empty() );
	assert!( composition.definitions_from( &Origin::new( "storage-plugin" )).is_empty() );
	assert_eq!( composition.inspect(| groups | groups.engine().instance_count() ), 0 );
	assert_eq!( factory.disposals( "db" ), 2 );

}
