use part_link::{ ImportDefinition, ImportConnection, InstanceUpdate, InstanceChange };
use crate::test_parts::{ TestFactory, definition, export, provider, inspect };

#[test]
fn lifecycle_release_chain() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();

	// a <- b <- c are prerequisites, e only optionally imports from c
	let ( a, _ ) = engine.construct( provider( "a", "A" ), vec![] ).unwrap();
	let ( b, _ ) = engine.construct(
		definition( "b", vec![ ImportDefinition::constructor( "a", 0, "A" )], vec![ export( "value", "B" )]),
		vec![ ImportConnection::new( "a", a, "value" )],
	).unwrap();
	let ( c, _ ) = engine.construct(
		definition( "c", vec![ ImportDefinition::property( "b", "b", "B" ).prerequisite( true )], vec![ export( "value", "C" )]),
		vec![ ImportConnection::new( "b", b, "value" )],
	).unwrap();
	let ( e, errors ) = engine.construct(
		definition( "e", vec![ ImportDefinition::property( "c", "c", "C" )], vec![] ),
		vec![ ImportConnection::new( "c", c, "value" )],
	).unwrap();
	assert_no_errors!( errors );
	let e_object = engine.object( e ).unwrap().clone();

	let ( updates, errors ) = engine.release( a ).unwrap();
	assert_no_errors!( errors );
	assert_eq!( updates, vec![
		InstanceUpdate { instance: e, change: InstanceChange::Updated },
		InstanceUpdate { instance: c, change: InstanceChange::Removed },
		InstanceUpdate { instance: b, change: InstanceChange::Removed },
		InstanceUpdate { instance: a, change: InstanceChange::Removed },
	]);

	assert_eq!( engine.instances().collect::<Vec<_>>(), vec![ e ]);
	assert!( engine.object( e ).unwrap().ptr_eq( &e_object ));
	assert!( engine.connections( e ).is_empty() );
	assert_eq!( inspect( &e_object, | part | part.property( "c" )), Some( vec![] ));

}
