pub mod raw;
mod processed;
mod client;

pub use processed::*;
pub use client::*;
