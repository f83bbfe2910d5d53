pub mod item;
pub mod monitor;
pub mod provider;
