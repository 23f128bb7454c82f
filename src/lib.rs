//! ssl-bot finds nginx virtual hosts served without TLS and secures them
//! with certbot, then keeps the issued certificates renewed.

pub mod bot;
pub mod certbot;
pub mod cli;
pub mod config;
pub mod logging;
pub mod nginx;
pub mod process;
pub mod report;

pub use bot::SslBot;
pub use config::AppConfig;
