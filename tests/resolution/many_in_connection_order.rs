use part_link::{ ImportDefinition, ImportConnection, ImportValue, Cardinality };
use crate::test_parts::{ TestFactory, definition, provider, inspect };

#[test]
fn resolution_many_in_connection_order() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();

	let ( a, _ ) = engine.construct( provider( "a", "E" ), vec![] ).unwrap();
	let ( b, _ ) = engine.construct( provider( "b", "E" ), vec![] ).unwrap();
	let ( c, _ ) = engine.construct( provider( "c", "E" ), vec![] ).unwrap();

	let consumer = definition( "consumer", vec![
		ImportDefinition::property( "all", "all", "E" ).with_cardinality( Cardinality::Many ),
	], vec![] );
	let ( instance, errors ) = engine.construct( consumer, vec![
		ImportConnection::new( "all", c, "value" ),
		ImportConnection::new( "all", a, "value" ),
		ImportConnection::new( "all", b, "value" ),
	]).unwrap();
	assert_no_errors!( errors );

	let object = engine.object( instance ).unwrap();
	assert_eq!( inspect( object, | part | part.property( "all" )), Some( vec![
		"c.value#2".to_string(),
		"a.value#0".to_string(),
		"b.value#1".to_string(),
	]));

	// A collection import with nothing connected is an empty collection.
	engine.update_if_required( instance, vec![] ).unwrap();
	let object = engine.object( instance ).unwrap();
	match inspect( object, | part | part.property_value( "all" ).cloned() ) {
		Some( ImportValue::Many( items )) if items.is_empty() => {}
		value => panic!( "Expected an empty collection, found: {:#?}", value ),
	}

}
