//! Query normalization layer

mod normalizer;

pub use normalizer::{NormalizationSource, NormalizedQuery, QueryNormalizer};
