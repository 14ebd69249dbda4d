use part_link::{
	ImportDefinition, ImportConnection, ImportShape, ExportDefinition, ExportKind,
	MethodSignature, ContractName, ComposeError, ConstructionError,
};
use crate::test_parts::{ TestFactory, definition };

#[test]
fn resolution_delegate_signature_mismatch() {

	let factory = TestFactory::new();
	let mut engine = factory.engine();

	let exported = MethodSignature::new([ "Name" ], Some( ContractName::new( "Greeting" )));
	let expected = MethodSignature::new([ "Name", "Name" ], Some( ContractName::new( "Greeting" )));

	let greeter = definition( "greeter", vec![], vec![
		ExportDefinition::new( "greet", "Greet", ExportKind::Method( exported.clone() )),
	]);
	let ( provider, _ ) = engine.construct( greeter, vec![] ).unwrap();

	let consumer = definition( "consumer", vec![
		ImportDefinition::constructor( "greet", 0, "Greet" ).with_shape( ImportShape::Delegate( expected.clone() )),
	], vec![] );

	match engine.construct( consumer, vec![ ImportConnection::new( "greet", provider, "greet" )]) {
		Err(( ComposeError::ConstructionFailed {
			instance,
			cause: ConstructionError::SignatureMismatch { import, expected: wanted, found },
		}, _ )) => {
			assert_eq!( import.as_str(), "greet" );
			assert_eq!(( wanted, found ), ( expected, exported ));
			assert!( !engine.is_live( instance ));
		},
		value => panic!( "Expected SignatureMismatch, found: {:#?}", value ),
	}
	assert_eq!( factory.constructions( "consumer" ), 0 );

}
