// src/app.rs
use crate::models::{Mail, Message, Subscriber, User};
use crate::repository::{PgRepository, Repository, SubscriberRepository};
use crate::{db, mails, messages, subscribers, users};
use actix_web::{HttpResponse, error, web};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository handles shared by every worker. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Repositories {
    users: Arc<dyn Repository<User>>,
    subscribers: Arc<dyn Repository<Subscriber>>,
    subscriber_levels: Arc<dyn SubscriberRepository>,
    messages: Arc<dyn Repository<Message>>,
    mails: Arc<dyn Repository<Mail>>,
}

impl Repositories {
    pub fn new<U, S, M, L>(users: Arc<U>, subscribers: Arc<S>, messages: Arc<M>, mails: Arc<L>) -> Self
    where
        U: Repository<User> + 'static,
        S: SubscriberRepository + 'static,
        M: Repository<Message> + 'static,
        L: Repository<Mail> + 'static,
    {
        Self {
            users,
            subscribers: subscribers.clone(),
            subscriber_levels: subscribers,
            messages,
            mails,
        }
    }

    /// Postgres repositories over one shared pool.
    pub fn postgres(pool: &PgPool) -> Self {
        Self::new(
            Arc::new(PgRepository::<User>::new(pool.clone())),
            Arc::new(PgRepository::<Subscriber>::new(pool.clone())),
            Arc::new(PgRepository::<Message>::new(pool.clone())),
            Arc::new(PgRepository::<Mail>::new(pool.clone())),
        )
    }

    /// Registers the repositories, body/path error handling and every resource route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.users.clone()))
            .app_data(web::Data::from(self.subscribers.clone()))
            .app_data(web::Data::from(self.subscriber_levels.clone()))
            .app_data(web::Data::from(self.messages.clone()))
            .app_data(web::Data::from(self.mails.clone()))
            .app_data(json_config());

        users::init_routes(cfg);
        subscribers::init_routes(cfg);
        messages::init_routes(cfg);
        mails::init_routes(cfg);
    }
}

/// Malformed or mistyped bodies are the client's fault.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Invalid request body: {}", err);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({"error": "Invalid request"})),
        )
        .into()
    })
}

pub fn init_health(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}

pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    match db::ping(&pool).await {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ok"})),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError().json(json!({"status": "unavailable"}))
        }
    }
}
