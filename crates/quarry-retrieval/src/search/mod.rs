//! Source retrieval: per-store retrievers, parallel fan-out, RRF fusion.

pub mod fanout;
pub mod fulltext;
pub mod graph;
pub mod rrf;
pub mod vector;

pub use fanout::{run_fanout, FanoutOutcome, FanoutRequest};
pub use fulltext::FulltextRetriever;
pub use graph::GraphRetriever;
pub use vector::VectorRetriever;
