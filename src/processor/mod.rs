pub mod aggregator;
pub mod normalizer;
pub mod optimizer;
pub mod segmenter;
pub mod tracker;
