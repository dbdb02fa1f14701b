//! `/api` routes.

use std::time::Instant;

use actix_service::Service;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};
use credvault_core::types::{ApiResponse, CredentialPatch, NewCredential};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use tracing_attributes::instrument;

use crate::error::{json_error, query_error, ApiError};
use crate::WebState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

type Handled = Result<HttpResponse, ApiError>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    backend: &'static str,
    time: String,
}

/// Register every route plus the JSON and query extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health))
                .service(
                    web::resource("/credentials")
                        .route(web::get().to(list_credentials))
                        .route(web::post().to(create_credential)),
                )
                // before `{id}` so that "stats" is never taken for an id
                .route("/credentials/stats", web::get().to(credential_stats))
                .service(
                    web::resource("/credentials/{id}")
                        .route(web::get().to(get_credential))
                        .route(web::patch().to(update_credential))
                        .route(web::delete().to(delete_credential)),
                )
                .wrap_fn(|req, srv| {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let span = tracing::info_span!(
                        "request",
                        id = %request_id,
                        method = %req.method(),
                        path = %req.path(),
                    );
                    let started = Instant::now();
                    let fut = srv.call(req);

                    async move {
                        let mut result = fut.await;
                        if let Ok(ref mut res) = result {
                            tracing::info!(
                                status = res.status().as_u16(),
                                elapsed_ms = u64::try_from(started.elapsed().as_millis())
                                    .unwrap_or(u64::MAX),
                                "Request handled"
                            );
                            if let Ok(value) = HeaderValue::from_str(&request_id) {
                                res.headers_mut()
                                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                            }
                        }
                        result
                    }
                    .instrument(span)
                }),
        );
}

async fn health(state: web::Data<WebState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(Health {
        status: "ok",
        backend: state.app.backend.as_str(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

#[instrument(skip_all, fields(search = query.search.is_some(), page = ?query.page))]
async fn list_credentials(state: web::Data<WebState>, query: web::Query<ListParams>) -> Handled {
    let ListParams {
        search,
        page,
        page_size,
    } = query.into_inner();
    let result = state
        .app
        .credential_service
        .list(search.as_deref(), page, page_size)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

#[instrument(skip_all)]
async fn create_credential(state: web::Data<WebState>, body: web::Json<NewCredential>) -> Handled {
    let record = state
        .app
        .credential_service
        .create(body.into_inner())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

#[instrument(skip_all, fields(id = %id))]
async fn get_credential(state: web::Data<WebState>, id: web::Path<String>) -> Handled {
    let record = state
        .app
        .credential_service
        .get(&id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

#[instrument(skip_all, fields(id = %id))]
async fn update_credential(
    state: web::Data<WebState>,
    id: web::Path<String>,
    body: web::Json<CredentialPatch>,
) -> Handled {
    let record = state
        .app
        .credential_service
        .update(&id, body.into_inner())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

#[instrument(skip_all, fields(id = %id))]
async fn delete_credential(state: web::Data<WebState>, id: web::Path<String>) -> Handled {
    state
        .app
        .credential_service
        .delete(&id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::empty()))
}

#[instrument(skip_all, fields(window_days = ?query.window_days))]
async fn credential_stats(state: web::Data<WebState>, query: web::Query<StatsParams>) -> Handled {
    let stats = state
        .app
        .credential_service
        .stats(query.window_days)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}
