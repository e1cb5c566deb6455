pub mod affordability;
pub mod application;
pub mod products;
pub mod simulate;
