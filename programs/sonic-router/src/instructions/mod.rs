//! Instruction handlers for the Sonic Router

pub mod constants;
pub mod lamport_transfer;
pub mod validation;

pub mod close_expired;
pub mod deposit_fee;
pub mod open_session;
pub mod send_message;

#[allow(ambiguous_glob_reexports)]
pub use close_expired::*;
#[allow(ambiguous_glob_reexports)]
pub use deposit_fee::*;
#[allow(ambiguous_glob_reexports)]
pub use open_session::*;
#[allow(ambiguous_glob_reexports)]
pub use send_message::*;
