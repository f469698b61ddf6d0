//! HTTP request handlers for the instareel web server

pub mod account;
pub mod extract;
pub mod health;
pub mod multipart;
pub mod reel;
pub mod types;

pub use account::*;
pub use health::*;
pub use reel::*;

pub use types::*;
