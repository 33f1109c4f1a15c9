//! Core SMTP types.

mod address;
mod extension;
mod reply;

pub use address::{Address, Envelope};
pub use extension::{AuthMechanism, Extension};
pub use reply::{Reply, ReplyCode};
