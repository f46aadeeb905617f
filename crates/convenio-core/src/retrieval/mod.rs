//! Multi-layer retrieval: anchors, similarity search, merging

mod anchors;
mod merger;
mod vector;

pub use anchors::AnchorRetriever;
pub use merger::{ResultMerger, RetrievalSource, RetrievedFragment};
pub use vector::VectorRetriever;
