use part_link::{ ConnectionGraph, Connection };

#[test]
fn graph_topological_sort_subset() {

	// a -> b -> c -> d, and a cycle d -> e -> d outside the subset
	let mut graph = ConnectionGraph::<&str, &str, &str>::new();
	[ "a", "b", "c", "d", "e" ].into_iter().for_each(| vertex | graph.add_vertex( vertex ));
	let link = | exporter, importer | Connection { importer, import: "in", exporter, export: "out" };
	graph.add_edge( link( "a", "b" ));
	graph.add_edge( link( "b", "c" ));
	graph.add_edge( link( "c", "d" ));
	graph.add_edge( link( "d", "e" ));
	graph.add_edge( link( "e", "d" ));

	let order = graph.topological_sort( &[ "d", "b", "c", "missing" ]).unwrap();
	assert_eq!( order, vec![ "b", "c", "d" ]);

	// With b left out nothing orders a against c.
	let mut order = graph.topological_sort( &[ "c", "a" ]).unwrap();
	order.sort_unstable();
	assert_eq!( order, vec![ "a", "c" ]);

}
