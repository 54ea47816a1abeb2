pub mod group;
pub mod listing;
