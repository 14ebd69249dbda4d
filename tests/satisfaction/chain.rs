use part_link::satisfaction::can_be_instantiated ;
use crate::dependency_view::StaticView ;

#[test]
fn satisfaction_chain() {

	let satisfied = StaticView::default()
		.part( 0, &[ "x" ], &[] ).connect( 0, "x", 1 )
		.part( 1, &[ "y" ], &[] ).connect( 1, "y", 2 )
		.part( 2, &[], &[] );
	assert!( can_be_instantiated( &satisfied, 0 ));

	let broken = StaticView::default()
		.part( 0, &[ "x" ], &[] ).connect( 0, "x", 1 )
		.part( 1, &[ "y" ], &[] ).connect( 1, "y", 2 )
		.part( 2, &[ "z" ], &[] );
	assert!( !can_be_instantiated( &broken, 0 ));
	assert!( !can_be_instantiated( &broken, 1 ));

}
