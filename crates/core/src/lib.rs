//! Core types, store keys, clock, and errors for the presence engine.

pub mod activity;
pub mod clock;
pub mod context;
pub mod error;
pub mod keys;
pub mod limits;
pub mod presence;
pub mod user;

pub use activity::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::*;
pub use error::{Error, Result, StoreErrorCode};
pub use presence::*;
pub use user::*;
