pub mod admin;
pub mod api;
pub mod audit;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod event;
pub mod export;
mod http_client;
pub mod lookup;
pub mod messages;
pub mod registry;
pub mod runner;
