use part_link::{ ConnectionGraph, Connection };

#[test]
fn graph_remove_in_edges_if() {

	let mut graph = ConnectionGraph::<&str, &str, &str>::new();
	[ "a", "b", "c" ].into_iter().for_each(| vertex | graph.add_vertex( vertex ));
	graph.add_edge( Connection { importer: "c", import: "first", exporter: "a", export: "out" });
	graph.add_edge( Connection { importer: "c", import: "second", exporter: "b", export: "out" });
	graph.add_edge( Connection { importer: "c", import: "third", exporter: "a", export: "out" });

	let removed = graph.remove_in_edges_if( &"c", | edge | edge.exporter == "a" );
	let removed = removed.into_iter().map(| edge | edge.import ).collect::<Vec<_>>();
	assert_eq!( removed, vec![ "first", "third" ]);

	let remaining = graph.in_edges( &"c" ).into_iter().map(| edge | edge.import ).collect::<Vec<_>>();
	assert_eq!( remaining, vec![ "second" ]);
	assert!( graph.out_edges( &"a" ).is_empty() );

}
