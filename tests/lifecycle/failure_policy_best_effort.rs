use part_link::{ ImportDefinition, ImportConnection, InstanceUpdate, InstanceChange, ComposeError, ConstructionError, FailurePolicy };
use crate::test_parts::{ TestFactory, definition, export, provider };

#[test]
fn lifecycle_failure_policy_best_effort() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();
	assert_eq!( engine.failure_policy(), FailurePolicy::BestEffort );

	let ( x1, _ ) = engine.construct( provider( "x1", "X" ), vec![] ).unwrap();
	let ( x2, _ ) = engine.construct( provider( "x2", "X" ), vec![] ).unwrap();
	let ( a, _ ) = engine.construct(
		definition( "a", vec![ ImportDefinition::constructor( "x", 0, "X" )], vec![ export( "value", "A" )]),
		vec![ ImportConnection::new( "x", x1, "value" )],
	).unwrap();
	let ( b, _ ) = engine.construct(
		definition( "b", vec![ ImportDefinition::constructor( "a", 0, "A" )], vec![ export( "value", "B" )]),
		vec![ ImportConnection::new( "a", a, "value" )],
	).unwrap();
	let ( c, errors ) = engine.construct(
		definition( "c", vec![ ImportDefinition::constructor( "b", 0, "B" )], vec![] ),
		vec![ ImportConnection::new( "b", b, "value" )],
	).unwrap();
	assert_no_errors!( errors );

	factory.fail( "b" );
	let ( updates, errors ) = engine.update_if_required( a, vec![ ImportConnection::new( "x", x2, "value" )]).unwrap();
	assert_eq!( updates, vec![ InstanceUpdate { instance: a, change: InstanceChange::Reconstructed }]);

	match errors.as_slice() {
		[
			ComposeError::ConstructionFailed { instance: first, cause: ConstructionError::Factory( _ )},
			ComposeError::ConstructionFailed { instance: second, cause: ConstructionError::ProviderNotLive { provider, .. }},
		] if *first == b && *second == c && *provider == b => {}
		value => panic!( "Expected failures of b and then c, found: {:#?}", value ),
	}

	assert!( engine.contains( b ) && !engine.is_live( b ));
	assert!( engine.contains( c ) && !engine.is_live( c ));

	// Once the provider can be built again its dependents follow.
	factory.heal( "b" );
	let connections = engine.connections( b );
	let ( updates, errors ) = engine.update_if_required( b, connections ).unwrap();
	assert_no_errors!( errors );
	assert_eq!( updates, vec![
		InstanceUpdate { instance: c, change: InstanceChange::Reconstructed },
		InstanceUpdate { instance: b, change: InstanceChange::Reconstructed },
	]);
	assert!( engine.is_live( c ));

}
