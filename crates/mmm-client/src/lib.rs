mod api_interfaces;
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod discounts;
pub mod error;
pub mod export;
pub mod loader;
pub mod meal_plan;
pub mod places;
pub mod promotions;
pub mod selection;
pub mod session;
pub mod sheet;
mod util;

pub use client::{Client, EndpointConfig};
pub use config::AppConfig;
pub use util::default_http_client;
