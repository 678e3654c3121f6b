pub mod detector;
pub mod period_search;
pub mod synthesizer;
