use actix_web::http::{header, StatusCode};
use actix_web::HttpRequest;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::NotifyError;

const EMBED_COLOR: u32 = 15158332;
const MISSING: &str = "brak";

/// Cookie carrying the anonymous visitor id
pub const VISITOR_COOKIE: &str = "school_uuid";

/// Request details attached to a server error report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub route: String,
    pub method: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub visitor: Option<String>,
    pub message: Option<String>,
}

impl ErrorReport {
    /// Request details known before the handler runs; `message` is filled in
    /// from the failed response
    pub fn from_request(req: &HttpRequest) -> Self {
        ErrorReport {
            route: req.path().to_string(),
            method: req.method().to_string(),
            ip: req.connection_info().realip_remote_addr().map(str::to_string),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            visitor: req.cookie(VISITOR_COOKIE).map(|c| c.value().to_string()),
            message: None,
        }
    }

    pub fn is_reportable(status: StatusCode) -> bool {
        status == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Discord webhook payload with a request embed and a stacktrace embed
    pub fn to_payload(&self) -> serde_json::Value {
        let ip = self.ip.as_deref().unwrap_or(MISSING);
        let user_agent = self.user_agent.as_deref().unwrap_or(MISSING);
        let visitor = self.visitor.as_deref().unwrap_or(MISSING);
        let message = self.message.as_deref().unwrap_or("brak danych");

        json!({
            "embeds": [
                {
                    "title": "Błąd 500: informacje o zapytaniu",
                    "color": EMBED_COLOR,
                    "fields": [
                        { "name": "Route", "value": format!("`{}`", self.route) },
                        { "name": "Metoda", "value": format!("`{}`", self.method) },
                        { "name": "IP", "value": format!("`{}`", ip) },
                        { "name": "User-Agent", "value": format!("```{}```", user_agent) },
                        { "name": "UUID", "value": format!("`{}`", visitor) }
                    ]
                },
                {
                    "title": "Stacktrace",
                    "color": EMBED_COLOR,
                    "description": format!("```\n{}\n```", message)
                }
            ]
        })
    }
}

/// Posts error reports to a Discord webhook; does nothing when unconfigured
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: Option<String>,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn from_webhook(webhook: Option<String>) -> Self {
        DiscordNotifier {
            webhook: webhook.filter(|url| !url.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    pub async fn send(&self, report: &ErrorReport) -> Result<(), NotifyError> {
        let Some(webhook) = &self.webhook else {
            return Ok(());
        };

        let response = self.client.post(webhook).json(&report.to_payload()).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        debug!(route = %report.route, "error report delivered");
        Ok(())
    }

    /// Sends the report, logging instead of failing
    pub async fn report(&self, report: ErrorReport) {
        if let Err(e) = self.send(&report).await {
            error!(error = %e, route = %report.route, "could not send error report to Discord");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_fields() {
        let report = ErrorReport {
            route: "/klasy/1A".to_string(),
            method: "GET".to_string(),
            ip: Some("127.0.0.1".to_string()),
            user_agent: None,
            visitor: Some("abc".to_string()),
            message: Some("boom".to_string()),
        };
        let payload = report.to_payload();
        let fields = payload["embeds"][0]["fields"].as_array().unwrap();
        assert_eq!(fields[0]["value"], "`/klasy/1A`");
        assert_eq!(fields[3]["value"], "```brak```");
        assert_eq!(fields[4]["value"], "`abc`");
        assert_eq!(payload["embeds"][1]["description"], "```\nboom\n```");
        assert_eq!(payload["embeds"][0]["color"], 15158332);
    }

    #[test]
    fn test_report_from_request() {
        let req = actix_web::test::TestRequest::post()
            .uri("/api/terminal?x=1")
            .insert_header((header::USER_AGENT, "Firefox"))
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .cookie(actix_web::cookie::Cookie::new(VISITOR_COOKIE, "abc-123"))
            .to_http_request();

        let report = ErrorReport::from_request(&req);
        assert_eq!(report.route, "/api/terminal");
        assert_eq!(report.method, "POST");
        assert_eq!(report.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(report.user_agent.as_deref(), Some("Firefox"));
        assert_eq!(report.visitor.as_deref(), Some("abc-123"));
        assert_eq!(report.message, None);
    }

    #[test]
    fn test_report_from_bare_request() {
        let req = actix_web::test::TestRequest::get().uri("/").to_http_request();
        let report = ErrorReport::from_request(&req);
        assert_eq!(report.user_agent, None);
        assert_eq!(report.visitor, None);
    }

    #[test]
    fn test_only_500_is_reportable() {
        assert!(ErrorReport::is_reportable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!ErrorReport::is_reportable(StatusCode::OK));
        assert!(!ErrorReport::is_reportable(StatusCode::NOT_FOUND));
        assert!(!ErrorReport::is_reportable(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_a_no_op() {
        let notifier = DiscordNotifier::from_webhook(None);
        assert!(!notifier.is_enabled());
        assert!(notifier.send(&ErrorReport::default()).await.is_ok());
    }
}
