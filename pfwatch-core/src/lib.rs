pub mod config;
pub mod services;
pub mod utils;

pub use config::CoreConfig;
pub use services::{Listing, Screen};
