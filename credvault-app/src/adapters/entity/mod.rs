//! `SeaORM` entities shared by both backends.

pub mod credential;
