//! Business logic service layer

mod credential_service;

pub use credential_service::{
    CredentialService, DEFAULT_STATS_WINDOW_DAYS, MAX_STATS_WINDOW_DAYS,
};
