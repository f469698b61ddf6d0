//! Request/response types used by the handlers

pub mod account;
pub mod common;
pub mod reel;

pub use account::*;
pub use common::*;
pub use reel::*;
