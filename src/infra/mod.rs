pub mod cache;
pub mod catalog;
pub mod prices;
pub mod report;
