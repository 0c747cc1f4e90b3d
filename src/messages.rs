// src/messages.rs
use crate::crud::{self, Payload};
use crate::models::Message;
use actix_web::web;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/messages").configure(crud::routes::<Message>));
}

impl Payload for Message {}
