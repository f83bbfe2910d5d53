pub mod controller;
pub mod export;
pub mod paginator;
pub mod search;
pub mod session;
