//! Integration tests for the card REST client against a fake service

use std::io::Read;
use std::sync::{Arc, Mutex};

use entrypass::api::{AssetFiles, CardApi, UpdateFieldMode};
use entrypass::card::CardDraft;
use entrypass::session::Session;
use entrypass::{Error, ExportConfig};

/// One observed request: method, path, auth header, and raw body.
#[derive(Debug, Clone)]
struct Captured {
    method: String,
    url: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

type Responder = Box<dyn Fn(&Captured) -> (u16, String) + Send>;

/// Spawn a fake card service; `respond` maps each captured request to a
/// status and JSON body. Returns the base URL plus the capture log.
fn spawn_server(respond: Responder) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let log = Arc::new(Mutex::new(Vec::new()));
    let thread_log = log.clone();

    std::thread::spawn(move || {
        while let Ok(mut request) = server.recv() {
            let mut body = Vec::new();
            let _ = request.as_reader().read_to_end(&mut body);
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let captured = Captured {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                authorization,
                body,
            };
            let (status, payload) = respond(&captured);
            thread_log.lock().unwrap().push(captured);
            let response = tiny_http::Response::from_string(payload)
                .with_status_code(status)
                .with_header(
                    "Content-Type: application/json"
                        .parse::<tiny_http::Header>()
                        .unwrap(),
                );
            let _ = request.respond(response);
        }
    });

    (format!("http://{}", addr), log)
}

fn config_for(base: &str) -> (ExportConfig, Arc<Session>) {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        api_base_url: format!("{}/", base),
        token_path: dir.path().join("token"),
        ..Default::default()
    };
    let session = Arc::new(Session::open(config.token_path.clone()));
    // Keep the scratch dir alive for the test process.
    std::mem::forget(dir);
    (config, session)
}

const RECORD_JSON: &str = r#"{
    "_id": "abc123",
    "employeeName": "Ravi Kumar",
    "bloodGroup": "B+",
    "cardNo": "C-42",
    "validTill": "2099-01-01T00:00:00.000Z"
}"#;

#[test]
fn login_stores_the_token_and_authorizes_later_calls() {
    let (base, log) = spawn_server(Box::new(|req| {
        if req.url.starts_with("/auth/login") {
            (200, r#"{"token":"tok-1","message":"welcome"}"#.to_string())
        } else {
            (200, RECORD_JSON.to_string())
        }
    }));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session.clone()).unwrap();

    api.login("admin@example.com", "secret").unwrap();
    assert!(session.is_authenticated());

    let record = api.get_by_id("abc123").unwrap();
    assert_eq!(record.employee_name, "Ravi Kumar");

    let log = log.lock().unwrap();
    assert_eq!(log[0].url, "/auth/login");
    assert!(log[0].authorization.is_none());
    assert_eq!(log[1].url, "/card/abc123");
    assert_eq!(log[1].authorization.as_deref(), Some("Bearer tok-1"));
}

#[test]
fn public_view_never_sends_the_bearer_token() {
    let (base, log) = spawn_server(Box::new(|_| (200, RECORD_JSON.to_string())));
    let (config, session) = config_for(&base);
    session.set_token("tok-1").unwrap();
    let api = CardApi::new(&config, session).unwrap();

    let record = api.view("abc123").unwrap();
    assert_eq!(record.id.as_deref(), Some("abc123"));

    let log = log.lock().unwrap();
    assert_eq!(log[0].url, "/card/view/abc123");
    assert!(log[0].authorization.is_none());
}

#[test]
fn missing_records_map_to_not_found() {
    let (base, _log) = spawn_server(Box::new(|_| {
        (404, r#"{"message":"Card not found"}"#.to_string())
    }));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    let err = api.get_by_id("nope").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
}

#[test]
fn server_messages_surface_on_write_failures() {
    let (base, _log) = spawn_server(Box::new(|_| {
        (500, r#"{"message":"upload quota exceeded"}"#.to_string())
    }));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    let err = api.delete("abc123").unwrap_err();
    match err {
        Error::NetworkFailure(message) => assert_eq!(message, "upload quota exceeded"),
        other => panic!("expected NetworkFailure, got {:?}", other),
    }
}

#[test]
fn list_and_search_tolerate_envelopes_and_bare_arrays() {
    let (base, _log) = spawn_server(Box::new(|req| {
        if req.url.starts_with("/card/search") {
            (200, format!("[{}]", RECORD_JSON))
        } else {
            (200, format!(r#"{{"cards":[{}]}}"#, RECORD_JSON))
        }
    }));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    let all = api.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].card_no, "C-42");

    let found = api.search("ravi").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].employee_name, "Ravi Kumar");
}

#[test]
fn search_query_is_url_encoded() {
    let (base, log) = spawn_server(Box::new(|_| (200, "[]".to_string())));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    api.search("ravi kumar").unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log[0].url, "/card/search?q=ravi+kumar");
}

#[test]
fn compat_update_drops_empty_fields_from_the_payload() {
    let (base, log) = spawn_server(Box::new(|_| (200, RECORD_JSON.to_string())));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();
    assert_eq!(config.update_field_mode, UpdateFieldMode::Compat);

    let draft = CardDraft {
        employee_name: "Ravi Kumar".into(),
        father_name: String::new(),
        ..Default::default()
    };
    api.update("abc123", &draft, &AssetFiles::default()).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "PUT");
    assert_eq!(log[0].url, "/card/abc123");
    let body = String::from_utf8_lossy(&log[0].body);
    assert!(body.contains(r#"name="employeeName""#));
    // The cleared field never reaches the wire; the server keeps its value.
    assert!(!body.contains(r#"name="fatherName""#));
}

#[test]
fn send_all_mode_makes_clearing_explicit() {
    let (base, log) = spawn_server(Box::new(|_| (200, RECORD_JSON.to_string())));
    let (mut config, session) = config_for(&base);
    config.update_field_mode = UpdateFieldMode::SendAll;
    let api = CardApi::new(&config, session).unwrap();

    let draft = CardDraft {
        employee_name: "Ravi Kumar".into(),
        father_name: String::new(),
        ..Default::default()
    };
    api.update("abc123", &draft, &AssetFiles::default()).unwrap();

    let body_log = log.lock().unwrap();
    let body = String::from_utf8_lossy(&body_log[0].body);
    assert!(body.contains(r#"name="fatherName""#));
}

#[test]
fn create_uploads_text_fields_and_asset_files() {
    let (base, log) = spawn_server(Box::new(|_| (200, RECORD_JSON.to_string())));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("photo.png");
    std::fs::write(&photo, b"not-really-a-png").unwrap();

    let draft = CardDraft {
        employee_name: "Ravi Kumar".into(),
        ..Default::default()
    };
    let files = AssetFiles {
        photo: Some(photo),
        ..Default::default()
    };
    let record = api.create(&draft, &files).unwrap();
    assert_eq!(record.id.as_deref(), Some("abc123"));

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "POST");
    assert_eq!(log[0].url, "/card/create");
    let body = String::from_utf8_lossy(&log[0].body);
    assert!(body.contains(r#"name="employeeName""#));
    // Create always sends the full field set, empty or not.
    assert!(body.contains(r#"name="fatherName""#));
    assert!(body.contains(r#"name="photo""#));
    assert!(body.contains("not-really-a-png"));
}

#[test]
fn otp_flow_returns_server_acknowledgements() {
    let (base, log) = spawn_server(Box::new(|req| {
        let message = match req.url.as_str() {
            "/auth/send-otp" => "OTP sent to your email",
            "/auth/verify-otp" => "OTP verified",
            "/auth/reset-password-otp" => "Password has been reset",
            other => panic!("unexpected path {}", other),
        };
        (200, format!(r#"{{"message":"{}"}}"#, message))
    }));
    let (config, session) = config_for(&base);
    let api = CardApi::new(&config, session).unwrap();

    assert_eq!(api.send_otp("admin@example.com").unwrap(), "OTP sent to your email");
    assert_eq!(api.verify_otp("admin@example.com", "123456").unwrap(), "OTP verified");
    assert_eq!(
        api.reset_password_otp("admin@example.com", "123456", "new-pass", "new-pass")
            .unwrap(),
        "Password has been reset"
    );

    let log = log.lock().unwrap();
    let body = String::from_utf8_lossy(&log[2].body);
    assert!(body.contains("confirmPassword"));
}

#[test]
fn logout_is_client_side_and_idempotent() {
    let (base, log) = spawn_server(Box::new(|_| (200, "{}".to_string())));
    let (config, session) = config_for(&base);
    session.set_token("tok-1").unwrap();
    let api = CardApi::new(&config, session.clone()).unwrap();

    api.logout().unwrap();
    assert!(!session.is_authenticated());
    api.logout().unwrap();
    // No request ever left the client.
    assert!(log.lock().unwrap().is_empty());
}
