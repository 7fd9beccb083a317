pub mod canned;
pub mod provider;
pub mod table;

pub use canned::{CannedResponder, DelayRange};
pub use provider::{Reply, Responder, ResponderError};
pub use table::{ResponseTable, fallback_response};
