//! Type definitions

pub mod campaign;
pub mod contact;
pub mod recipients;
pub mod send;

pub use campaign::*;
pub use contact::*;
pub use recipients::*;
pub use send::*;
