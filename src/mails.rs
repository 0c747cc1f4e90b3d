// src/mails.rs
use crate::crud::{self, Payload};
use crate::error::ApiError;
use crate::models::Mail;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/mails")
            .configure(crud::routes::<Mail>)
            .route("/send", web::post().to(send_mail)),
    );
}

impl Payload for Mail {
    fn validate(&self) -> Result<(), ApiError> {
        let blank_recipient = self.to.iter().any(|r| r.trim().is_empty());
        if self.to.is_empty()
            || blank_recipient
            || self.subject.trim().is_empty()
            || self.body.trim().is_empty()
        {
            tracing::debug!("Mail rejected: missing required fields");
            return Err(ApiError::bad_request(
                "Missing required fields: 'to', 'subject', 'body'",
            ));
        }
        Ok(())
    }
}

// Delivery is not wired to any transport: the mail is validated, stamped
// and echoed back, nothing is stored.
pub async fn send_mail(body: web::Json<Mail>) -> Result<HttpResponse, ApiError> {
    let mut mail = body.into_inner();
    mail.validate()?;
    mail.sent_at = Utc::now();

    tracing::info!(
        recipients = mail.to.len(),
        subject = %mail.subject,
        "Mail send requested, no transport configured"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Mail sent successfully",
        "mail": mail,
    })))
}
