//! Domain models for the membership program.

pub mod loyalty;
pub mod member;
pub mod patient;
pub mod tier;
