//! Alert headers read by the front-end to display notifications
//!
//! Successful mutations carry `X-{app}-alert` with a message key such as
//! `commentApp.comment.created` and `X-{app}-params` with the record id.
//! Rejected requests carry `X-{app}-error` (`error.{key}`) and
//! `X-{app}-params` with the entity name.

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::FailureAlert;

#[derive(Debug, Clone)]
pub struct AlertHeaders {
    application_name: String,
    alert: HeaderName,
    error: HeaderName,
    params: HeaderName,
}

impl AlertHeaders {
    pub fn new(application_name: &str) -> Result<Self> {
        let header = |suffix: &str| {
            let name = format!("X-{}-{}", application_name, suffix);
            HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid alert header name '{}'", name))
        };

        Ok(Self {
            application_name: application_name.to_string(),
            alert: header("alert")?,
            error: header("error")?,
            params: header("params")?,
        })
    }

    pub fn created(&self, entity: &str, id: i64) -> HeaderMap {
        self.entity_alert(entity, "created", id)
    }

    pub fn updated(&self, entity: &str, id: i64) -> HeaderMap {
        self.entity_alert(entity, "updated", id)
    }

    pub fn deleted(&self, entity: &str, id: i64) -> HeaderMap {
        self.entity_alert(entity, "deleted", id)
    }

    fn entity_alert(&self, entity: &str, action: &str, id: i64) -> HeaderMap {
        let message = format!("{}.{}.{}", self.application_name, entity, action);
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, &self.alert, &message);
        self.insert(&mut headers, &self.params, &id.to_string());
        headers
    }

    pub fn failure(&self, alert: &FailureAlert) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, &self.error, &format!("error.{}", alert.key));
        self.insert(&mut headers, &self.params, alert.entity);
        headers
    }

    fn insert(&self, headers: &mut HeaderMap, name: &HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name.clone(), value);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "Skipping unencodable alert header"),
        }
    }
}

/// Turn the [`FailureAlert`] left by a rejected request into error headers
pub async fn failure_alert_headers(
    State(alerts): State<AlertHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(alert) = response.extensions_mut().remove::<FailureAlert>() {
        response.headers_mut().extend(alerts.failure(&alert));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_alert() {
        let alerts = AlertHeaders::new("commentApp").unwrap();
        let headers = alerts.created("comment", 12);

        assert_eq!(headers.get("x-commentapp-alert").unwrap(), "commentApp.comment.created");
        assert_eq!(headers.get("x-commentapp-params").unwrap(), "12");
    }

    #[test]
    fn test_updated_and_deleted_alerts() {
        let alerts = AlertHeaders::new("blog").unwrap();

        assert_eq!(alerts.updated("comment", 1).get("X-blog-alert").unwrap(), "blog.comment.updated");
        assert_eq!(alerts.deleted("comment", 2).get("X-blog-alert").unwrap(), "blog.comment.deleted");
        assert_eq!(alerts.deleted("comment", 2).get("X-blog-params").unwrap(), "2");
    }

    #[test]
    fn test_failure_alert() {
        let alerts = AlertHeaders::new("commentApp").unwrap();
        let headers = alerts.failure(&FailureAlert { entity: "comment", key: "idexists" });

        assert_eq!(headers.get("X-commentApp-error").unwrap(), "error.idexists");
        assert_eq!(headers.get("X-commentApp-params").unwrap(), "comment");
        assert!(headers.get("X-commentApp-alert").is_none());
    }

    #[test]
    fn test_invalid_application_name_rejected() {
        assert!(AlertHeaders::new("comment app").is_err());
    }
}
