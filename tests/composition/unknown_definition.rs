use part_link::{ Composition, CompositionError, GroupId, PartTypeId, Origin };
use crate::test_parts::TestFactory ;
use crate::test_groups::storage ;

#[test]
fn composition_unknown_definition() {

	let factory = TestFactory::new();
	let composition = Composition::new( factory.clone() );
	let group = GroupId::new();

	match composition.add_group( group, ( *storage() ).clone() ) {
		Err(( CompositionError::UnknownDefinition( part ), _ )) if part.as_str() == "db" => {}
		value => panic!( "Expected UnknownDefinition, found: {:#?}", value ),
	}
	assert!( composition.groups().is_empty() );

	crate::catalog( &composition );
	assert_eq!( composition.definitions_from( &Origin::new( "storage-plugin" )).len(), 2 );
	assert!( composition.definition( &PartTypeId::new( "handler" )).is_some() );

	let ( updates, errors ) = composition.add_group( group, ( *storage() ).clone() ).unwrap();
	assert_no_errors!( errors );
	assert_eq!( updates.len(), 2 );
	assert_eq!( composition.groups(), vec![ group ]);

	match composition.add_group( group, ( *storage() ).clone() ) {
		Err(( CompositionError::Group( part_link::GroupError::DuplicateGroup( duplicate )), _ )) if duplicate == group => {}
		value => panic!( "Expected DuplicateGroup, found: {:#?}", value ),
	}

}
