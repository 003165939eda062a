pub mod aggregator;
pub mod replay;
pub mod tracker;

#[cfg(test)]
mod tracker_tests;
