// src/models/mod.rs
pub mod cargo;
pub mod dispatch;
pub mod notification;
pub mod recipient;

pub use cargo::*;
pub use dispatch::*;
pub use notification::*;
pub use recipient::*;
