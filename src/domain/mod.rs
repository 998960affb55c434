//! Domain Layer
//!
//! Core business logic with no infrastructure dependencies.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
