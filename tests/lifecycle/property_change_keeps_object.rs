use part_link::{ ImportDefinition, ImportConnection, InstanceUpdate, InstanceChange };
use crate::test_parts::{ TestFactory, Event, definition, export, provider, inspect };

#[test]
fn lifecycle_property_change_keeps_object() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();

	let ( a1, _ ) = engine.construct( provider( "a1", "E" ), vec![] ).unwrap();
	let ( a2, _ ) = engine.construct( provider( "a2", "E" ), vec![] ).unwrap();
	let ( c, _ ) = engine.construct(
		definition( "c", vec![ ImportDefinition::property( "e", "e", "E" )], vec![ export( "value", "C" )]),
		vec![ ImportConnection::new( "e", a1, "value" )],
	).unwrap();
	let ( d, errors ) = engine.construct(
		definition( "d", vec![ ImportDefinition::constructor( "c", 0, "C" )], vec![] ),
		vec![ ImportConnection::new( "c", c, "value" )],
	).unwrap();
	assert_no_errors!( errors );

	let object = engine.object( c ).unwrap().clone();
	let dependent = engine.object( d ).unwrap().clone();
	assert_eq!( inspect( &object, | part | part.property( "e" )), Some( vec![ "a1.value#0".to_string() ]));
	factory.clear_events();

	// Only the property is reassigned; the dependent keeps its object.
	let ( updates, errors ) = engine.update_if_required( c, vec![ ImportConnection::new( "e", a2, "value" )]).unwrap();
	assert_no_errors!( errors );
	assert_eq!( updates, vec![ InstanceUpdate { instance: c, change: InstanceChange::Updated }]);

	assert!( engine.object( c ).unwrap().ptr_eq( &object ));
	assert!( engine.object( d ).unwrap().ptr_eq( &dependent ));
	assert_eq!( inspect( &object, | part | part.property( "e" )), Some( vec![ "a2.value#1".to_string() ]));
	assert_eq!( factory.events(), vec![ Event::Assigned { part: "c".to_string(), serial: 2, import: "e".to_string() }]);

}
