pub mod api;
pub mod app_data;
pub mod availability;
pub mod booking;
pub mod checkin;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod management;
pub mod metrics;

pub use api::*;
pub use app_data::*;
pub use booking::*;
pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use metrics::*;
