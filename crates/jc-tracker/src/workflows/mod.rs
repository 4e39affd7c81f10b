pub mod quip;
pub mod tracker;
