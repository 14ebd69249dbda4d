#[macro_export]
macro_rules! assert_no_errors {
	( $errors:expr ) => {
		if !$errors.is_empty() { panic!( "Produced errors: {:?}", $errors ) }
	};
}
