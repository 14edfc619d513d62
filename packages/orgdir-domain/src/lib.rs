pub mod geo;
pub mod hierarchy;
pub mod page;
