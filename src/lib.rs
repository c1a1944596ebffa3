pub mod api;
pub mod cli;
pub mod core;
pub mod ews;
pub mod graph;
