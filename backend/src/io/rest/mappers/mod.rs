//! Mappers translating between shared DTOs and domain models.

pub mod member_mapper;
pub mod patient_mapper;
