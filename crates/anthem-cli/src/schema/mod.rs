pub mod graph_document;
