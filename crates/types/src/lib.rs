pub mod account;
pub mod error;
pub mod health;
pub mod request;
pub mod result;
pub mod snapshot;
pub mod state;
pub mod strategy;
pub mod timing;

pub use account::*;
pub use error::*;
pub use health::*;
pub use request::*;
pub use result::*;
pub use snapshot::*;
pub use state::*;
pub use strategy::*;
pub use timing::*;

pub const PROTOCOL_VERSION: &str = "1.0";
