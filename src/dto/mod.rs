pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod settings;
pub mod upload;
pub mod users;
