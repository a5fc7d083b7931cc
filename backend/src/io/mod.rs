//! # IO Layer
//!
//! Interface layer exposing the domain services to the outside world.

pub mod rest;
