//! Report delivery for anomaly digests.
//!
//! This crate provides:
//! - `Deliverer` trait for pluggable delivery channels
//! - Messaging (document API) and FTP upload implementations
//! - Dispatcher that delivers through the configured channel and always
//!   removes the local report file afterwards

pub mod dispatcher;
pub mod ftp;
pub mod messaging;
pub mod traits;

pub use dispatcher::DeliveryDispatcher;
pub use traits::{Deliverer, DeliveryError, DispatchResult};
