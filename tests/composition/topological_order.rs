use part_link::{ Composition, GroupId, PartKey, PartInstanceId };
use crate::test_parts::{ TestFactory, inspect };
use crate::test_groups::{ storage, web, connection };

#[test]
fn composition_topological_order() {

	let factory = TestFactory::new();
	let composition = Composition::new( factory.clone() );
	crate::catalog( &composition );

	let ( backend, frontend ) = ( GroupId::new(), GroupId::new() );
	composition.add_group( frontend, ( *web() ).clone() ).unwrap();
	composition.add_group( backend, ( *storage() ).clone() ).unwrap();
	let ( _, errors ) = composition.connect( connection( frontend, "backend", backend, "cache" )).unwrap();
	assert_no_errors!( errors );

	let instance = | group, key: &str | composition.parts( group ).unwrap().into_iter()
		.find(|( candidate, _ )| candidate.as_str() == key )
		.and_then(|( _, instance )| instance )
		.unwrap();
	let ( db, cache, handler ) = ( instance( backend, "db" ), instance( backend, "cache" ), instance( frontend, "handler" ));

	let order = composition.topological_order().unwrap();
	assert_eq!( order.len(), 3 );
	let position = | target: PartInstanceId | order.iter().position(| candidate | *candidate == target ).unwrap();
	assert!( position( db ) < position( cache ));
	assert!( position( cache ) < position( handler ));

	assert!( composition.is_live( handler ));
	let object = composition.part_object( frontend, &PartKey::new( "handler" )).unwrap();
	assert!( object.ptr_eq( &composition.object( handler ).unwrap() ));
	assert_eq!( inspect( &object, | part | part.argument( "cache" )), vec![ "cache.value#1" ]);

}
