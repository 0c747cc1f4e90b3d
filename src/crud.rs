// src/crud.rs
//! Request handlers shared by every resource. Each one parses its input,
//! makes exactly one repository call and maps the outcome to a response.

use crate::error::ApiError;
use crate::repository::{Entity, Repository};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// A resource body accepted over HTTP.
pub trait Payload: Entity + Serialize + DeserializeOwned {
    /// Required-field checks. The repository trusts whatever passes here.
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Parses a path id, answering bad-request rather than the router's not-found.
pub fn parse_id<E: Entity>(raw: &str) -> Result<i32, ApiError> {
    raw.trim().parse::<i32>().map_err(|_| {
        tracing::debug!(raw, "{} id rejected", E::LABEL);
        ApiError::bad_request(format!("Invalid {} ID", E::LABEL.to_lowercase()))
    })
}

pub async fn list<E: Payload>(
    repo: web::Data<dyn Repository<E>>,
) -> Result<HttpResponse, ApiError> {
    let entities = repo
        .get_all()
        .await
        .map_err(|e| ApiError::from_storage(e, E::LABEL))?;
    Ok(HttpResponse::Ok().json(entities))
}

pub async fn get_one<E: Payload>(
    repo: web::Data<dyn Repository<E>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id::<E>(&path)?;
    match repo.get(id).await {
        Ok(Some(entity)) => Ok(HttpResponse::Ok().json(entity)),
        Ok(None) => {
            tracing::warn!(id, "{} not found", E::LABEL);
            Err(ApiError::NotFound(format!("{} not found", E::LABEL)))
        }
        Err(e) => Err(ApiError::from_storage(e, E::LABEL)),
    }
}

pub async fn create<E: Payload>(
    repo: web::Data<dyn Repository<E>>,
    body: web::Json<E>,
) -> Result<HttpResponse, ApiError> {
    let entity = body.into_inner();
    entity.validate()?;
    let created = repo
        .create(entity)
        .await
        .map_err(|e| ApiError::from_storage(e, E::LABEL))?;
    tracing::info!(id = created.id(), "{} created", E::LABEL);
    Ok(HttpResponse::Ok().json(created))
}

pub async fn update<E: Payload>(
    repo: web::Data<dyn Repository<E>>,
    path: web::Path<String>,
    body: web::Json<E>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id::<E>(&path)?;
    let entity = body.into_inner();
    entity.validate()?;
    let updated = repo
        .update(id, entity)
        .await
        .map_err(|e| ApiError::from_storage(e, E::LABEL))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete<E: Payload>(
    repo: web::Data<dyn Repository<E>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id::<E>(&path)?;
    repo.delete(id)
        .await
        .map_err(|e| ApiError::from_storage(e, E::LABEL))?;
    tracing::info!(id, "{} deleted", E::LABEL);
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} deleted successfully", E::LABEL),
    })))
}

/// Registers the five standard routes for `E` on the current scope.
pub fn routes<E: Payload>(cfg: &mut web::ServiceConfig) {
    cfg.route("/getall", web::get().to(list::<E>))
        .route("/get/{id}", web::get().to(get_one::<E>))
        .route("/create", web::post().to(create::<E>))
        .route("/update/{id}", web::put().to(update::<E>))
        .route("/delete/{id}", web::delete().to(delete::<E>));
}
