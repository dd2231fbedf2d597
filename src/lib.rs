pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod session;
pub mod token;
