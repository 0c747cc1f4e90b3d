// src/subscribers.rs
use crate::crud::{self, Payload};
use crate::error::ApiError;
use crate::models::{Subscriber, UpdateLevelRequest};
use crate::repository::SubscriberRepository;
use actix_web::{HttpResponse, web};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/subscribers")
            .configure(crud::routes::<Subscriber>)
            .route("/getall/{lvl}", web::get().to(get_by_level))
            .route("/updatelevel/{id}", web::put().to(update_level)),
    );
}

impl Payload for Subscriber {}

pub async fn get_by_level(
    repo: web::Data<dyn SubscriberRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let level = path.into_inner();
    let subscribers = repo
        .get_by_level(&level)
        .await
        .map_err(|e| ApiError::from_storage(e, "Subscriber"))?;
    tracing::debug!(level = %level, count = subscribers.len(), "Subscribers listed by level");
    Ok(HttpResponse::Ok().json(subscribers))
}

pub async fn update_level(
    repo: web::Data<dyn SubscriberRepository>,
    path: web::Path<String>,
    body: web::Json<UpdateLevelRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = crud::parse_id::<Subscriber>(&path)?;
    let level = body.into_inner().subscription_level;
    if level.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Missing required field: 'subscription_level'",
        ));
    }

    let updated = repo
        .update_level(id, &level)
        .await
        .map_err(|e| ApiError::from_storage(e, "Subscriber"))?;
    tracing::info!(id, level = %updated.subscription_level, "Subscriber level updated");
    Ok(HttpResponse::Ok().json(updated))
}
