//! Database error classification.
//!
//! Turns `SeaORM`/`sqlx` failures into [`CoreError`] kinds. Native codes
//! (SQLSTATE, `SQLite` extended result codes) stop here and only survive as
//! detail text.

use credvault_core::error::CoreError;
use credvault_core::utils::truncate_for_log;
use sea_orm::sqlx;
use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// Which backend produced the error. Connectivity means different things
/// for an embedded file and a remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    Local,
    Remote,
}

/// Classify a `SeaORM` error.
pub fn classify(err: &DbErr, origin: StoreOrigin) -> CoreError {
    let classified = classify_inner(err, origin);
    let kind = classified.kind().as_str();
    log::debug!(
        kind = kind;
        "Classified database error as {kind}: {}",
        truncate_for_log(&err.to_string())
    );
    classified
}

fn classify_inner(err: &DbErr, origin: StoreOrigin) -> CoreError {
    match err {
        DbErr::RecordNotFound(msg) => return CoreError::NotFound(msg.clone()),
        DbErr::ConnectionAcquire(e) => return acquire_timeout(origin, &e.to_string()),
        _ => {}
    }

    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
        return CoreError::Conflict(truncate_for_log(&msg));
    }

    if let Some(sqlx_err) = sqlx_error(err) {
        return classify_sqlx(sqlx_err, origin);
    }

    match err {
        DbErr::Conn(RuntimeErr::Internal(msg)) => match origin {
            StoreOrigin::Remote => CoreError::Network(truncate_for_log(msg)),
            StoreOrigin::Local => CoreError::database(truncate_for_log(msg), false),
        },
        DbErr::Migration(msg) | DbErr::Custom(msg) | DbErr::Type(msg) | DbErr::Json(msg) => {
            CoreError::database(truncate_for_log(msg), false)
        }
        DbErr::RecordNotUpdated => CoreError::NotFound("record not updated".to_string()),
        other => CoreError::Unknown(truncate_for_log(&other.to_string())),
    }
}

fn sqlx_error(err: &DbErr) -> Option<&sqlx::Error> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => Some(e),
        _ => None,
    }
}

fn acquire_timeout(origin: StoreOrigin, detail: &str) -> CoreError {
    let detail = format!("connection acquire failed: {detail}");
    match origin {
        StoreOrigin::Remote => CoreError::Network(detail),
        StoreOrigin::Local => CoreError::database(detail, true),
    }
}

fn classify_sqlx(err: &sqlx::Error, origin: StoreOrigin) -> CoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            let message = truncate_for_log(db_err.message());
            match origin {
                StoreOrigin::Remote => from_sqlstate(&code, &message),
                StoreOrigin::Local => from_sqlite_code(&code, &message),
            }
        }
        sqlx::Error::PoolTimedOut => acquire_timeout(origin, "pool timed out"),
        sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
        sqlx::Error::Configuration(e) => {
            CoreError::database(format!("configuration: {}", truncate_for_log(&e.to_string())), false)
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            let detail = truncate_for_log(&err.to_string());
            match origin {
                StoreOrigin::Remote => CoreError::Network(detail),
                StoreOrigin::Local => CoreError::database(detail, false),
            }
        }
        other => CoreError::Unknown(truncate_for_log(&other.to_string())),
    }
}

/// Field errors reach callers verbatim, so the native message stays in the
/// debug log written by [`classify`].
fn constraint_violation() -> CoreError {
    CoreError::invalid_field("record", "violates a storage constraint")
}

/// Map a Postgres SQLSTATE onto the error taxonomy.
pub(crate) fn from_sqlstate(code: &str, message: &str) -> CoreError {
    let detail = format!("SQLSTATE {code}: {message}");
    match code {
        "23505" => CoreError::Conflict(detail),
        "23503" | "23502" | "23514" | "22001" | "22P02" => constraint_violation(),
        "42501" => CoreError::Permission(detail),
        "40001" | "40P01" | "53300" => CoreError::database(detail, true),
        "57014" => CoreError::Network(detail),
        c if c.starts_with("57P0") || c.starts_with("08") => CoreError::Network(detail),
        // Undefined object, authentication, disk full and the rest of the
        // schema/system classes are not going to heal on retry.
        c if ["42", "28", "53", "58", "XX", "3D", "3F"]
            .iter()
            .any(|class| c.starts_with(class)) =>
        {
            CoreError::database(detail, false)
        }
        c if c.starts_with("22") || c.starts_with("23") => constraint_violation(),
        _ => CoreError::Unknown(detail),
    }
}

/// Map a `SQLite` (extended) result code onto the error taxonomy.
pub(crate) fn from_sqlite_code(code: &str, message: &str) -> CoreError {
    let detail = format!("SQLite error {code}: {message}");
    let Ok(extended) = code.parse::<i32>() else {
        return CoreError::database(detail, false);
    };

    match extended {
        // SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY
        2067 | 1555 => CoreError::Conflict(detail),
        // BUSY / LOCKED and their extended variants
        c if matches!(c & 0xff, 5 | 6) => CoreError::database(detail, true),
        // PERM / AUTH
        c if matches!(c & 0xff, 3 | 23) => CoreError::Permission(detail),
        // Remaining constraint failures: NOT NULL, CHECK, FOREIGN KEY
        c if c & 0xff == 19 => constraint_violation(),
        // FULL, CORRUPT, CANTOPEN, READONLY, IOERR, NOTADB and anything else
        _ => CoreError::database(detail, false),
    }
}
