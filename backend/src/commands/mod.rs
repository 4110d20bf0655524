pub mod auth;
pub mod chat;
pub mod disease;
pub mod market;
pub mod soil;
pub mod weather;
