//! HTTP integration tests for the attendance client.
//!
//! Each test starts a throwaway axum server on a random local port that
//! answers the way the attendance server does, then drives the real
//! client against it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rollcall_core::client::client_for;
use rollcall_core::{AttendanceOutcome, FrameCapture, RollcallError, SubmitFlow};
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(5);

/// What the stub saw in a multipart upload.
#[derive(Debug, Clone, Default)]
struct SeenPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    len: usize,
}

/// Bind a router to 127.0.0.1:0 and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

/// `/mark_attendance` stub answering with a fixed status and raw body.
async fn mark_server(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<Vec<SeenPart>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let router = Router::new().route(
        "/mark_attendance",
        post(move |mut multipart: Multipart| {
            let recorder = Arc::clone(&recorder);
            async move {
                while let Ok(Some(field)) = multipart.next_field().await {
                    let mut part = SeenPart {
                        name: field.name().unwrap_or_default().to_string(),
                        filename: field.file_name().map(str::to_string),
                        content_type: field.content_type().map(str::to_string),
                        len: 0,
                    };
                    part.len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                    recorder.lock().unwrap().push(part);
                }
                (status, body)
            }
        }),
    );
    (serve(router).await, seen)
}

fn frame() -> FrameCapture {
    FrameCapture::upload(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4], "scan.jpg")
}

// ============================================================================
// Multipart flow
// ============================================================================

#[tokio::test]
async fn test_multipart_match() {
    let (url, seen) = mark_server(
        StatusCode::OK,
        r#"{"success": true, "status": "success", "message": "Attendance marked successfully",
            "student_name": "Asha Verma", "roll_number": 17, "time": "09:12:44"}"#,
    )
    .await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let outcome = client.submit(frame()).await;
    assert_eq!(
        outcome,
        AttendanceOutcome::Matched {
            person_name: "Asha Verma".into(),
            person_id: "17".into(),
            timestamp: "09:12:44".into(),
            message: "Attendance marked successfully".into(),
        }
    );

    let parts = seen.lock().unwrap().clone();
    assert_eq!(parts.len(), 1, "exactly one form field");
    assert_eq!(parts[0].name, "image");
    assert_eq!(parts[0].filename.as_deref(), Some("scan.jpg"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(parts[0].len, 8);
}

#[tokio::test]
async fn test_multipart_no_face_detected() {
    let (url, _) = mark_server(
        StatusCode::OK,
        r#"{"success": false, "error": "No face detected"}"#,
    )
    .await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let outcome = client.submit(frame()).await;
    assert_eq!(
        outcome,
        AttendanceOutcome::NoMatch {
            message: "No face detected".into()
        }
    );
}

#[tokio::test]
async fn test_multipart_already_marked() {
    let (url, _) = mark_server(
        StatusCode::OK,
        r#"{"success": true, "status": "already_marked",
            "message": "Attendance already marked for today", "time": "10:05"}"#,
    )
    .await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    match client.submit(frame()).await {
        AttendanceOutcome::AlreadyMarked { timestamp, message } => {
            assert_eq!(timestamp, "10:05");
            assert_eq!(message, "Attendance already marked for today");
        }
        other => panic!("expected AlreadyMarked, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_with_json_body_is_no_match() {
    let (url, _) = mark_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"success": false, "message": "Error processing image"}"#,
    )
    .await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    assert_eq!(
        client.submit(frame()).await,
        AttendanceOutcome::NoMatch {
            message: "Error processing image".into()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let (url, _) = mark_server(StatusCode::OK, "<html>gateway</html>").await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    match client.submit(frame()).await {
        AttendanceOutcome::TransportError { message } => {
            assert!(message.starts_with("Malformed response"), "{message}");
        }
        other => panic!("expected TransportError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_without_json_is_transport_error() {
    let (url, _) = mark_server(StatusCode::BAD_GATEWAY, "upstream down").await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    match client.submit(frame()).await {
        AttendanceOutcome::TransportError { message } => {
            assert!(message.contains("502"), "{message}");
        }
        other => panic!("expected TransportError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Reserve a port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), SubmitFlow::Multipart, TIMEOUT).unwrap();
    match client.submit(frame()).await {
        AttendanceOutcome::TransportError { message } => {
            assert!(message.starts_with("Network error"), "{message}");
        }
        other => panic!("expected TransportError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let router = Router::new().route(
        "/mark_attendance",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"success": true}))
        }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, Duration::from_millis(200)).unwrap();

    assert!(matches!(
        client.submit(frame()).await,
        AttendanceOutcome::TransportError { .. }
    ));
}

// ============================================================================
// Base64 JSON flow
// ============================================================================

async fn process_server(response: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let router = Router::new().route(
        "/attendance/process-attendance",
        post(move |Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            let response = response.clone();
            async move {
                recorder.lock().unwrap().push(body);
                Json(response)
            }
        }),
    );
    (serve(router).await, seen)
}

#[tokio::test]
async fn test_json_flow_sends_data_url() {
    let (url, seen) = process_server(json!({
        "success": true,
        "message": "Attendance marked for Asha Verma",
        "student": {"name": "Asha Verma", "university_id": 2412345678u64}
    }))
    .await;
    let client = client_for(&url, SubmitFlow::Base64Json, TIMEOUT).unwrap();

    let frame = frame();
    let expected_time = frame.local_time();
    let outcome = client.submit(frame).await;

    assert_eq!(
        outcome,
        AttendanceOutcome::Matched {
            person_name: "Asha Verma".into(),
            person_id: "2412345678".into(),
            timestamp: expected_time,
            message: "Attendance marked for Asha Verma".into(),
        }
    );

    let bodies = seen.lock().unwrap().clone();
    let image = bodies[0]["image"].as_str().expect("image field");
    assert!(image.starts_with("data:image/jpeg;base64,"), "{image}");
    assert_eq!(image, "data:image/jpeg;base64,/9j/4AECAwQ=");
}

#[tokio::test]
async fn test_json_flow_already_marked() {
    let (url, _) = process_server(json!({
        "success": true,
        "already_marked": true,
        "message": "Attendance already marked today",
        "student": {"name": "Asha Verma", "university_id": "2412345678"}
    }))
    .await;
    let client = client_for(&url, SubmitFlow::Base64Json, TIMEOUT).unwrap();

    let outcome = client.submit(frame()).await;
    assert!(matches!(outcome, AttendanceOutcome::AlreadyMarked { .. }));
    assert_eq!(outcome.message(), "Attendance already marked today");
}

#[tokio::test]
async fn test_json_flow_no_match() {
    let (url, _) = process_server(json!({
        "success": false,
        "message": "No matching student found"
    }))
    .await;
    let client = client_for(&url, SubmitFlow::Base64Json, TIMEOUT).unwrap();

    assert_eq!(
        client.submit(frame()).await,
        AttendanceOutcome::NoMatch {
            message: "No matching student found".into()
        }
    );
}

// ============================================================================
// Today's attendance and export
// ============================================================================

#[tokio::test]
async fn test_fetch_today_empty() {
    let router = Router::new().route(
        "/attendance/today-attendance",
        get(|| async {
            Json(json!({"attendance": [], "stats": {"present": 0, "absent": 40, "total": 40}}))
        }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let today = client.fetch_today().await.unwrap();
    assert!(today.records.is_empty());
    assert_eq!(today.stats.absent, 40);
}

#[tokio::test]
async fn test_fetch_today_records() {
    let router = Router::new().route(
        "/attendance/today-attendance",
        get(|| async {
            Json(json!({
                "attendance": [
                    {"university_id": "2412345678", "name": "Asha Verma", "time": "2025-01-15 09:12:44"},
                    {"university_id": "2498765432", "name": "Ravi Kumar", "time": "2025-01-15 09:14:02"}
                ],
                "stats": {"present": 2, "absent": 38, "total": 40}
            }))
        }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let today = client.fetch_today().await.unwrap();
    assert_eq!(today.records.len(), 2);
    assert_eq!(today.records[1].name, "Ravi Kumar");
    assert_eq!(today.stats.present, 2);
}

#[tokio::test]
async fn test_fetch_today_server_error() {
    let router = Router::new().route(
        "/attendance/today-attendance",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let err = client.fetch_today().await.unwrap_err();
    assert!(matches!(err, RollcallError::Transport(_)), "{err}");
}

#[tokio::test]
async fn test_export_passes_date() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        "/attendance/download-attendance",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = params.get("date").cloned();
                Json(json!({
                    "success": true,
                    "csv_data": "University ID,Name,Time\n2412345678,Asha Verma,09:12:44\n",
                    "filename": "attendance_2025-01-15.csv"
                }))
            }
        }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let export = client.fetch_export(Some(date)).await.unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("2025-01-15"));
    assert_eq!(export.filename, "attendance_2025-01-15.csv");
    assert!(String::from_utf8(export.csv).unwrap().contains("Asha Verma"));
}

#[tokio::test]
async fn test_export_rejection() {
    let router = Router::new().route(
        "/attendance/download-attendance",
        get(|| async { Json(json!({"success": false, "message": "No attendance data found"})) }),
    );
    let url = serve(router).await;
    let client = client_for(&url, SubmitFlow::Multipart, TIMEOUT).unwrap();

    match client.fetch_export(None).await {
        Err(RollcallError::ServerRejection(message)) => {
            assert_eq!(message, "No attendance data found");
        }
        other => panic!("expected ServerRejection, got {other:?}"),
    }
}
