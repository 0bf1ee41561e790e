pub mod lifetime;
pub mod ticker;
