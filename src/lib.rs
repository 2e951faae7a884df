pub mod analyzer;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod model;
pub mod output;
pub mod version;

pub use analyzer::{analyze_solution, extract_relationships, Relationship};
pub use client::ApiClient;
pub use config::Config;
pub use error::{Result, SolmapError};
pub use graph::{build_graph, SolutionGraph};
