pub mod config;
pub mod error;
pub mod record;
pub mod window;

pub use config::{Config, DeliveryTarget, FtpCredentials};
pub use error::*;
pub use record::*;
pub use window::QueryWindow;
