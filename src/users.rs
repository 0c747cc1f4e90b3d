// src/users.rs
use crate::config::Config;
use crate::crud::{self, Payload};
use crate::error::ApiError;
use crate::models::User;
use crate::repository::Repository;
use actix_web::{HttpResponse, web};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("/getall", web::get().to(crud::list::<User>))
            .route("/get/{id}", web::get().to(crud::get_one::<User>))
            .route("/create", web::post().to(create_user))
            .route("/update/{id}", web::put().to(update_user))
            .route("/delete/{id}", web::delete().to(crud::delete::<User>)),
    );
}

impl Payload for User {
    fn validate(&self) -> Result<(), ApiError> {
        if self.login.trim().is_empty() {
            return Err(ApiError::bad_request("Login is required"));
        }
        Ok(())
    }
}

/// Replaces a clear-text password with its bcrypt hash.
async fn hash_password(user: &mut User, cost: u32) -> Result<(), ApiError> {
    let Some(plain) = user.password.take() else {
        return Ok(());
    };

    let hashed = web::block(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            tracing::error!("Password hashing error: {}", e);
            ApiError::Internal
        })?;

    user.password = Some(hashed);
    Ok(())
}

pub async fn create_user(
    repo: web::Data<dyn Repository<User>>,
    config: web::Data<Config>,
    body: web::Json<User>,
) -> Result<HttpResponse, ApiError> {
    let mut user = body.into_inner();
    user.validate()?;
    hash_password(&mut user, config.bcrypt_cost).await?;

    let created = repo.create(user).await.map_err(|e| {
        if e.is_unique_violation() {
            tracing::warn!("Login already taken");
        }
        ApiError::from_storage(e, "User")
    })?;
    tracing::info!(id = created.id, "User created");
    Ok(HttpResponse::Ok().json(created))
}

/// Full replace of the stored user. The password is never sent back to
/// clients, so a body without `password` (such as an edited GET response)
/// clears the stored hash; clients must resend it to keep it.
pub async fn update_user(
    repo: web::Data<dyn Repository<User>>,
    config: web::Data<Config>,
    path: web::Path<String>,
    body: web::Json<User>,
) -> Result<HttpResponse, ApiError> {
    let id = crud::parse_id::<User>(&path)?;
    let mut user = body.into_inner();
    user.validate()?;
    hash_password(&mut user, config.bcrypt_cost).await?;

    let updated = repo
        .update(id, user)
        .await
        .map_err(|e| ApiError::from_storage(e, "User"))?;
    Ok(HttpResponse::Ok().json(updated))
}
