pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod palette;
pub mod types;

pub use config::HopperConfig;
pub use error::HopperError;
pub use events::QueueEvent;
pub use message::{Message, StatsSnapshot};
pub use types::Counter;
