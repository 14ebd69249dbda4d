use part_link::{ GroupLayer, GroupId, GroupError };
use crate::test_parts::TestFactory ;
use crate::test_groups::{ storage, web };

#[test]
fn group_duplicate_group() {

	let factory = TestFactory::new();
	let mut groups = GroupLayer::new( factory.engine() );
	let group = GroupId::new();

	let ( _, errors ) = groups.add( group, storage() ).unwrap();
	assert_no_errors!( errors );

	match groups.add( group, web() ) {
		Err(( GroupError::DuplicateGroup( duplicate ), _ )) if duplicate == group => {}
		value => panic!( "Expected DuplicateGroup, found: {:#?}", value ),
	}

	// The original group is untouched.
	assert_eq!( groups.engine().instance_count(), 2 );
	assert_eq!( groups.group( group ).map(| definition | definition.parts().len() ), Some( 2 ));
	assert_eq!( factory.constructions( "handler" ), 0 );

}
