pub mod feed;
pub mod listings;
pub mod recommendations;
