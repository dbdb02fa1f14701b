//! Storage layer abstraction trait definition

mod credential_repository;

pub use credential_repository::CredentialRepository;
