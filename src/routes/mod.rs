pub mod health;
pub mod resources;
