//! Credential queries shared by both backends.
//!
//! Every function takes any `ConnectionTrait` (in practice an open
//! transaction) and returns already-classified errors.
//!
//! Searches match the `*_search` columns, which hold the Rust-lowercased
//! service and username. SQLite's `LOWER()` and `LIKE` fold only ASCII, so
//! folding in SQL would make the backends disagree on non-ASCII text.

use chrono::{DateTime, Duration, Utc};
use credvault_core::error::{CoreError, CoreResult};
use credvault_core::types::{
    sort_service_counts, CredentialPatch, CredentialRecord, CredentialStats, ListQuery,
    NewCredential, PaginatedResponse, ServiceCount,
};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use super::db_error::{classify, StoreOrigin};
use super::entity::credential;

impl credential::Model {
    fn into_record(self) -> CredentialRecord {
        CredentialRecord {
            id: self.id,
            service: self.service,
            username: self.username,
            secret: self.secret,
            url: self.url,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn record_to_active_model(record: &CredentialRecord) -> credential::ActiveModel {
    credential::ActiveModel {
        id: Set(record.id.clone()),
        service: Set(record.service.clone()),
        username: Set(record.username.clone()),
        secret: Set(record.secret.clone()),
        url: Set(record.url.clone()),
        notes: Set(record.notes.clone()),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
        service_search: Set(record.service.to_lowercase()),
        username_search: Set(record.username.to_lowercase()),
    }
}

/// Escape `LIKE` wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring match on service OR username.
fn search_condition(term: &str) -> Condition {
    let pattern = like_pattern(term);
    let matches =
        |column: credential::Column| column.like(LikeExpr::new(pattern.clone()).escape('\\'));
    Condition::any()
        .add(matches(credential::Column::ServiceSearch))
        .add(matches(credential::Column::UsernameSearch))
}

/// Open a transaction on `db`.
pub async fn begin(db: &DatabaseConnection, origin: StoreOrigin) -> CoreResult<DatabaseTransaction> {
    db.begin().await.map_err(|e| classify(&e, origin))
}

/// Commit on success, roll back on failure. Consumes the transaction on every path.
pub async fn finish<T>(
    txn: DatabaseTransaction,
    result: CoreResult<T>,
    origin: StoreOrigin,
) -> CoreResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(|e| classify(&e, origin))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                log::warn!("Rollback failed after {}: {rollback_err}", err.kind());
            }
            Err(err)
        }
    }
}

pub async fn list<C>(
    conn: &C,
    query: &ListQuery,
    origin: StoreOrigin,
) -> CoreResult<PaginatedResponse<CredentialRecord>>
where
    C: ConnectionTrait,
{
    let mut select = credential::Entity::find();
    if let Some(ref term) = query.search {
        select = select.filter(search_condition(term));
    }

    let total = select
        .clone()
        .count(conn)
        .await
        .map_err(|e| classify(&e, origin))?;

    let pagination = query.pagination;
    let rows = select
        .order_by_desc(credential::Column::UpdatedAt)
        .order_by_asc(credential::Column::Id)
        .offset(pagination.offset())
        .limit(u64::from(pagination.page_size))
        .all(conn)
        .await
        .map_err(|e| classify(&e, origin))?;

    let items = rows.into_iter().map(credential::Model::into_record).collect();
    Ok(PaginatedResponse::new(items, pagination, total))
}

async fn find<C>(conn: &C, id: &str, origin: StoreOrigin) -> CoreResult<credential::Model>
where
    C: ConnectionTrait,
{
    credential::Entity::find_by_id(id.to_string())
        .one(conn)
        .await
        .map_err(|e| classify(&e, origin))?
        .ok_or_else(|| CoreError::NotFound(id.to_string()))
}

pub async fn get_by_id<C>(conn: &C, id: &str, origin: StoreOrigin) -> CoreResult<CredentialRecord>
where
    C: ConnectionTrait,
{
    find(conn, id, origin).await.map(credential::Model::into_record)
}

pub async fn create<C>(
    conn: &C,
    data: &NewCredential,
    origin: StoreOrigin,
) -> CoreResult<CredentialRecord>
where
    C: ConnectionTrait,
{
    let record = CredentialRecord::from_new(data.clone());
    credential::Entity::insert(record_to_active_model(&record))
        .exec_without_returning(conn)
        .await
        .map_err(|e| classify(&e, origin))?;
    Ok(record)
}

pub async fn update<C>(
    conn: &C,
    id: &str,
    patch: &CredentialPatch,
    origin: StoreOrigin,
) -> CoreResult<CredentialRecord>
where
    C: ConnectionTrait,
{
    let mut record = find(conn, id, origin).await?.into_record();
    record.apply(patch);

    credential::ActiveModel {
        id: Unchanged(record.id.clone()),
        created_at: Unchanged(record.created_at),
        ..record_to_active_model(&record)
    }
    .update(conn)
    .await
    .map_err(|e| classify(&e, origin))?;

    Ok(record)
}

pub async fn delete<C>(conn: &C, id: &str, origin: StoreOrigin) -> CoreResult<()>
where
    C: ConnectionTrait,
{
    let result = credential::Entity::delete_by_id(id.to_string())
        .exec(conn)
        .await
        .map_err(|e| classify(&e, origin))?;

    if result.rows_affected == 0 {
        return Err(CoreError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Start of a `window_days` window ending now; `None` when the window
/// reaches past the earliest representable instant.
fn window_start(window_days: u32) -> Option<DateTime<Utc>> {
    Utc::now().checked_sub_signed(Duration::days(i64::from(window_days)))
}

pub async fn stats<C>(conn: &C, window_days: u32, origin: StoreOrigin) -> CoreResult<CredentialStats>
where
    C: ConnectionTrait,
{
    let total = credential::Entity::find()
        .count(conn)
        .await
        .map_err(|e| classify(&e, origin))?;

    // A window older than any timestamp covers every record.
    let recent_count = match window_start(window_days) {
        Some(since) => credential::Entity::find()
            .filter(credential::Column::CreatedAt.gte(since))
            .count(conn)
            .await
            .map_err(|e| classify(&e, origin))?,
        None => total,
    };

    let grouped: Vec<(String, i64)> = credential::Entity::find()
        .select_only()
        .column(credential::Column::Service)
        .column_as(Expr::expr(Func::count(Expr::col(credential::Column::Id))), "count")
        .group_by(credential::Column::Service)
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| classify(&e, origin))?;

    let mut per_service: Vec<ServiceCount> = grouped
        .into_iter()
        .map(|(service, count)| ServiceCount {
            service,
            count: u64::try_from(count).unwrap_or_default(),
        })
        .collect();
    sort_service_counts(&mut per_service);

    Ok(CredentialStats {
        total,
        recent_count,
        window_days,
        per_service,
    })
}
