use part_link::{ ConnectionGraph, Connection };

#[test]
fn graph_edge_order() {

	let mut graph = ConnectionGraph::<u32, &str, &str>::new();
	graph.add_vertex( 1 );
	graph.add_vertex( 2 );
	graph.add_vertex( 3 );
	graph.add_vertex( 3 );
	assert_eq!( graph.vertex_count(), 3 );

	graph.add_edge( Connection { importer: 3, import: "many", exporter: 2, export: "value" });
	graph.add_edge( Connection { importer: 3, import: "many", exporter: 1, export: "value" });
	graph.add_edge( Connection { importer: 3, import: "other", exporter: 1, export: "other" });

	let imports = graph.in_edges( &3 ).into_iter()
		.map(| edge | ( edge.import, edge.exporter, edge.export ))
		.collect::<Vec<_>>();
	assert_eq!( imports, vec![( "many", 2, "value" ), ( "many", 1, "value" ), ( "other", 1, "other" )]);

	let dependents = graph.out_edges( &1 ).into_iter().map(| edge | edge.importer ).collect::<Vec<_>>();
	assert_eq!( dependents, vec![ 3, 3 ]);
	assert!( graph.in_edges( &1 ).is_empty() );

}
