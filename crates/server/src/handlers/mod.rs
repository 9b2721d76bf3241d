//! HTTP request handlers.

pub mod capabilities;
pub mod health;
pub mod sync;

pub use capabilities::*;
pub use health::*;
pub use sync::*;
