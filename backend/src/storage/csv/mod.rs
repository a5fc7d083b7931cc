//! File-based storage backend: YAML records per entity plus a CSV loyalty
//! ledger per member, laid out under a single data directory.

pub mod connection;
pub mod loyalty_repository;
pub mod member_repository;
pub mod patient_repository;

pub use connection::CsvConnection;
pub use loyalty_repository::LoyaltyRepository;
pub use member_repository::MemberRepository;
pub use patient_repository::PatientRepository;
