//! Desktop-side runtime for studytimer
//!
//! This crate provides:
//! - [`ApiClient`]: the REST client, also the engine's goal source
//! - [`AuthSession`]: the process-wide credential holder with change notification
//! - [`SessionGate`]: which screens are reachable without credentials
//! - [`TimerDriver`]: runs a timer engine against the wall clock

mod api_client;
mod driver;
mod gate;
mod session;

pub use api_client::*;
pub use driver::*;
pub use gate::*;
pub use session::*;
