use part_link::{ ImportDefinition, ImportConnection, InstanceUpdate, InstanceChange, ComposeError, ConstructionError };
use crate::test_parts::{ TestFactory, definition, export, provider };

#[test]
fn lifecycle_prerequisite_property_provider_fails() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();

	let ( x1, _ ) = engine.construct( provider( "x1", "X" ), vec![] ).unwrap();
	let ( x2, _ ) = engine.construct( provider( "x2", "X" ), vec![] ).unwrap();
	let ( a, _ ) = engine.construct(
		definition( "a", vec![ ImportDefinition::constructor( "x", 0, "X" )], vec![ export( "value", "A" )]),
		vec![ ImportConnection::new( "x", x1, "value" )],
	).unwrap();
	let ( d, errors ) = engine.construct(
		definition( "d", vec![ ImportDefinition::property( "a", "a", "A" ).prerequisite( true )], vec![] ),
		vec![ ImportConnection::new( "a", a, "value" )],
	).unwrap();
	assert_no_errors!( errors );
	assert!( engine.is_live( d ));

	factory.fail( "a" );
	let ( updates, errors ) = engine.update_if_required( a, vec![ ImportConnection::new( "x", x2, "value" )]).unwrap();
	assert!( updates.is_empty() );

	match errors.as_slice() {
		[
			ComposeError::ConstructionFailed { instance: first, cause: ConstructionError::Factory( _ )},
			ComposeError::ConstructionFailed { instance: second, cause: ConstructionError::ProviderNotLive { provider, .. }},
		] if *first == a && *second == d && *provider == a => {}
		value => panic!( "Expected failures of a and then d, found: {:#?}", value ),
	}

	// The dependent loses its object but keeps its place in the graph.
	assert!( engine.contains( d ) && !engine.is_live( d ));
	assert_eq!( factory.disposals( "d" ), 1 );
	assert_eq!( engine.connections( d ), vec![ ImportConnection::new( "a", a, "value" )]);

	factory.heal( "a" );
	let connections = engine.connections( a );
	let ( updates, errors ) = engine.update_if_required( a, connections ).unwrap();
	assert_no_errors!( errors );
	assert_eq!( updates, vec![
		InstanceUpdate { instance: d, change: InstanceChange::Reconstructed },
		InstanceUpdate { instance: a, change: InstanceChange::Reconstructed },
	]);
	assert!( engine.is_live( d ));

}
