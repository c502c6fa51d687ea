//! Client for the card service's REST contract.
//!
//! The service is a black box with a fixed surface: card CRUD plus the auth
//! endpoints. The bearer token rides along from the session whenever one is
//! present. There are no automatic retries anywhere; every retry is a user
//! action.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::card::{CardDraft, CardRecord, ValidityStatus};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::ExportConfig;

/// How update payloads treat empty text fields.
///
/// The historical client dropped empty fields from the multipart body, which
/// makes clearing a field via edit-and-save impossible: the server keeps its
/// stored value. `Compat` preserves that behaviour; `SendAll` transmits every
/// field so an empty string is an explicit clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateFieldMode {
    #[default]
    Compat,
    SendAll,
}

/// Local files selected for the card's asset slots, uploaded as multipart
/// file parts alongside the text fields.
#[derive(Debug, Clone, Default)]
pub struct AssetFiles {
    pub photo: Option<PathBuf>,
    pub sign: Option<PathBuf>,
    pub seal: Option<PathBuf>,
}

impl AssetFiles {
    pub fn is_empty(&self) -> bool {
        self.photo.is_none() && self.sign.is_none() && self.seal.is_none()
    }
}

/// The reduced field set exposed by the public verification surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    pub employee_name: String,
    pub adhar_card_number: String,
    pub address: String,
    /// Contracting agency.
    pub profile_name: String,
    /// Issuing authority.
    pub hirer: String,
    pub police_verification: String,
    pub date_of_issue: Option<NaiveDate>,
    pub valid_till: Option<NaiveDate>,
    pub status: &'static str,
}

impl VerificationView {
    /// Project a record down to the publicly exposed fields plus the
    /// validity badge evaluated against `today`.
    pub fn project(record: &CardRecord, today: NaiveDate) -> VerificationView {
        VerificationView {
            employee_name: record.employee_name.clone(),
            adhar_card_number: record.adhar_card_number.clone(),
            address: record.address.clone(),
            profile_name: record.profile_name.clone(),
            hirer: record.hirer.clone(),
            police_verification: record.police_verification.clone(),
            date_of_issue: record.date_of_issue,
            valid_till: record.valid_till,
            status: record.validity(today).label(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.status == ValidityStatus::Expired.label()
    }
}

/// Blocking client over the card/auth REST contract.
pub struct CardApi {
    http: Client,
    base: Url,
    session: Arc<Session>,
    update_mode: UpdateFieldMode,
}

impl CardApi {
    pub fn new(config: &ExportConfig, session: Arc<Session>) -> Result<CardApi> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        let base = Url::parse(&config.api_base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid API base URL: {}", e)))?;
        Ok(CardApi {
            http,
            base,
            session,
            update_mode: config.update_field_mode,
        })
    }

    // --- Card surface ---

    /// `POST /card/create`: multipart text fields plus any selected files.
    /// The server assigns the id and returns the full record.
    pub fn create(&self, draft: &CardDraft, files: &AssetFiles) -> Result<CardRecord> {
        let form = build_form(draft, files, UpdateFieldMode::SendAll)?;
        let response = self
            .authorize(self.http.post(self.url("card/create")?))
            .multipart(form)
            .send()
            .map_err(transport)?;
        record_from(check(response, "Card creation")?)
    }

    /// `GET /card`: every record visible to the authenticated caller.
    pub fn get_all(&self) -> Result<Vec<CardRecord>> {
        let response = self
            .authorize(self.http.get(self.url("card")?))
            .send()
            .map_err(transport)?;
        records_from(check(response, "Card listing")?)
    }

    /// `GET /card/{id}` (authenticated).
    pub fn get_by_id(&self, id: &str) -> Result<CardRecord> {
        let response = self
            .authorize(self.http.get(self.url(&format!("card/{}", id))?))
            .send()
            .map_err(transport)?;
        record_from(check(response, id)?)
    }

    /// `GET /card/view/{id}`: the public verification read, no auth header.
    pub fn view(&self, id: &str) -> Result<CardRecord> {
        let response = self
            .http
            .get(self.url(&format!("card/view/{}", id))?)
            .send()
            .map_err(transport)?;
        record_from(check(response, id)?)
    }

    /// `GET /card/search?q=`.
    pub fn search(&self, query: &str) -> Result<Vec<CardRecord>> {
        let mut url = self.url("card/search")?;
        url.query_pairs_mut().append_pair("q", query);
        let response = self
            .authorize(self.http.get(url))
            .send()
            .map_err(transport)?;
        records_from(check(response, "Card search")?)
    }

    /// `PUT /card/{id}`: full-record update, same multipart shape as create.
    /// Empty text fields follow the configured [`UpdateFieldMode`].
    pub fn update(&self, id: &str, draft: &CardDraft, files: &AssetFiles) -> Result<CardRecord> {
        let form = build_form(draft, files, self.update_mode)?;
        let response = self
            .authorize(self.http.put(self.url(&format!("card/{}", id))?))
            .multipart(form)
            .send()
            .map_err(transport)?;
        record_from(check(response, id)?)
    }

    /// `DELETE /card/{id}`. Returns the server's confirmation message.
    pub fn delete(&self, id: &str) -> Result<String> {
        let response = self
            .authorize(self.http.delete(self.url(&format!("card/{}", id))?))
            .send()
            .map_err(transport)?;
        Ok(message_from(check(response, id)?, "Card deleted"))
    }

    // --- Auth surface ---

    /// `POST /auth/login`. The returned bearer token is stored in the
    /// session, which notifies its observers.
    pub fn login(&self, email: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("auth/login")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(transport)?;
        let value = json_body(check(response, "Login")?)?;
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::NetworkFailure("Login response carried no token".to_string()))?;
        self.session.set_token(token)
    }

    /// Logout is client-side only: token presence is the entire auth signal,
    /// so dropping the stored token ends the session.
    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    /// `POST /auth/send-otp`.
    pub fn send_otp(&self, email: &str) -> Result<String> {
        self.auth_post("auth/send-otp", serde_json::json!({ "email": email }), "OTP sent")
    }

    /// `POST /auth/verify-otp`.
    pub fn verify_otp(&self, email: &str, otp: &str) -> Result<String> {
        self.auth_post(
            "auth/verify-otp",
            serde_json::json!({ "email": email, "otp": otp }),
            "OTP verified",
        )
    }

    /// `POST /auth/reset-password-otp`: the OTP-backed reset flow.
    pub fn reset_password_otp(
        &self,
        email: &str,
        otp: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String> {
        self.auth_post(
            "auth/reset-password-otp",
            serde_json::json!({
                "email": email,
                "otp": otp,
                "password": password,
                "confirmPassword": confirm_password,
            }),
            "Password reset",
        )
    }

    /// `POST /auth/reset-password`: the authenticated reset flow.
    pub fn reset_password(&self, password: &str, confirm_password: &str) -> Result<String> {
        self.auth_post(
            "auth/reset-password",
            serde_json::json!({
                "password": password,
                "confirmPassword": confirm_password,
            }),
            "Password reset",
        )
    }

    fn auth_post(&self, path: &str, body: Value, fallback: &str) -> Result<String> {
        let response = self
            .authorize(self.http.post(self.url(path)?))
            .json(&body)
            .send()
            .map_err(transport)?;
        Ok(message_from(check(response, path)?, fallback))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::ConfigError(format!("Invalid request path {}: {}", path, e)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::NetworkFailure(e.to_string())
}

// Map a non-success response to the error taxonomy, preferring the
// server-provided message when the error body is JSON.
fn check(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(context.to_string()));
    }
    if !status.is_success() {
        let message = response
            .json::<Value>()
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| format!("{}: request failed with status {}", context, status));
        return Err(Error::NetworkFailure(message));
    }
    Ok(response)
}

fn json_body(response: Response) -> Result<Value> {
    response
        .json()
        .map_err(|e| Error::NetworkFailure(format!("Malformed response body: {}", e)))
}

// The service wraps some responses in an envelope; unwrap the known keys
// and fall through to the bare value otherwise.
fn unwrap_envelope(value: Value, keys: &[&str]) -> Value {
    if let Value::Object(map) = &value {
        for key in keys {
            if let Some(inner) = map.get(*key) {
                if !inner.is_null() {
                    return inner.clone();
                }
            }
        }
    }
    value
}

fn record_from(response: Response) -> Result<CardRecord> {
    let value = unwrap_envelope(json_body(response)?, &["card", "data"]);
    serde_json::from_value(value)
        .map_err(|e| Error::NetworkFailure(format!("Malformed card payload: {}", e)))
}

fn records_from(response: Response) -> Result<Vec<CardRecord>> {
    let value = unwrap_envelope(json_body(response)?, &["cards", "data"]);
    serde_json::from_value(value)
        .map_err(|e| Error::NetworkFailure(format!("Malformed card list payload: {}", e)))
}

fn message_from(response: Response, fallback: &str) -> String {
    response
        .json::<Value>()
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| fallback.to_string())
}

fn build_form(draft: &CardDraft, files: &AssetFiles, mode: UpdateFieldMode) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in draft.wire_fields() {
        if mode == UpdateFieldMode::Compat && value.is_empty() {
            continue;
        }
        form = form.text(name, value);
    }
    for (name, path) in [
        ("photo", &files.photo),
        ("sign", &files.sign),
        ("seal", &files.seal),
    ] {
        if let Some(path) = path {
            form = form
                .file(name, path)
                .map_err(|e| Error::Other(format!("Failed to read {}: {}", path.display(), e)))?;
        }
    }
    Ok(form)
}
