//! HTTP client for the attendance server.
//!
//! ## Endpoints
//!
//! - `POST /mark_attendance` - multipart `image` upload
//! - `POST /attendance/process-attendance` - `{ "image": "<data URL>" }`
//! - `GET /attendance/today-attendance` - today's records and stats
//! - `GET /attendance/download-attendance` - CSV export
//!
//! [`AttendanceClient::submit`] never fails: every transport or parsing
//! problem is folded into [`AttendanceOutcome::TransportError`]. No request
//! is retried; a failed scan simply waits for the next trigger.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::NaiveDate;
use reqwest::{multipart, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{KioskConfig, SubmitFlow};
use crate::error::{Result, RollcallError};
use crate::media::FrameCapture;
use crate::outcome::{AttendanceOutcome, CsvExport, TodayAttendance};

const MARK_ATTENDANCE_PATH: &str = "mark_attendance";
const PROCESS_ATTENDANCE_PATH: &str = "attendance/process-attendance";
const TODAY_ATTENDANCE_PATH: &str = "attendance/today-attendance";
const DOWNLOAD_ATTENDANCE_PATH: &str = "attendance/download-attendance";

const ALREADY_MARKED_STATUS: &str = "already_marked";

/// Anything that can turn a frame into an [`AttendanceOutcome`].
///
/// Implementations must resolve to an outcome for every input and never
/// panic; the capture scheduler relies on this to restore its idle state.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn submit(&self, frame: FrameCapture) -> AttendanceOutcome;
}

/// Response of `POST /mark_attendance`.
#[derive(Debug, Deserialize)]
struct MarkAttendanceResponse {
    success: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    roll_number: Option<serde_json::Value>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StudentRef {
    name: String,
    university_id: serde_json::Value,
}

/// Response of `POST /attendance/process-attendance`.
#[derive(Debug, Deserialize)]
struct ProcessAttendanceResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    student: Option<StudentRef>,
    #[serde(default)]
    already_marked: bool,
}

/// Response of `GET /attendance/download-attendance`.
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    success: bool,
    #[serde(default)]
    csv_data: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Render an id that the server may send as a number or a string.
fn id_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn classify_mark(response: MarkAttendanceResponse) -> AttendanceOutcome {
    let timestamp = response.time.unwrap_or_default();

    if !response.success {
        let message = response
            .error
            .or(response.message)
            .unwrap_or_else(|| "No face recognized or student not found".to_string());
        return AttendanceOutcome::NoMatch { message };
    }

    if response.status.as_deref() == Some(ALREADY_MARKED_STATUS) {
        let message = response
            .message
            .unwrap_or_else(|| "Attendance already marked".to_string());
        return AttendanceOutcome::AlreadyMarked { timestamp, message };
    }

    let person_name = response.student_name.unwrap_or_default();
    let message = response
        .message
        .unwrap_or_else(|| format!("Attendance marked for {person_name}"));
    AttendanceOutcome::Matched {
        person_id: response.roll_number.as_ref().map(id_text).unwrap_or_default(),
        person_name,
        timestamp,
        message,
    }
}

fn classify_process(response: ProcessAttendanceResponse, frame_time: String) -> AttendanceOutcome {
    if !response.success {
        let message = response
            .message
            .unwrap_or_else(|| "No matching student found".to_string());
        return AttendanceOutcome::NoMatch { message };
    }

    if response.already_marked {
        let message = response
            .message
            .unwrap_or_else(|| "Attendance already marked".to_string());
        return AttendanceOutcome::AlreadyMarked {
            timestamp: frame_time,
            message,
        };
    }

    let (person_name, person_id) = response
        .student
        .map(|s| (s.name, id_text(&s.university_id)))
        .unwrap_or_default();
    let message = response
        .message
        .unwrap_or_else(|| format!("Attendance marked for {person_name}"));
    AttendanceOutcome::Matched {
        person_name,
        person_id,
        timestamp: frame_time,
        message,
    }
}

/// Decode a JSON body regardless of HTTP status; the server reports
/// application errors in the body.
fn parse_body<R: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<R> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(status = %status, error = %e, "Failed to parse JSON response");
        if status.is_success() {
            RollcallError::Transport(format!("Malformed response from attendance server: {e}"))
        } else {
            RollcallError::Transport(format!("Attendance server returned status: {status}"))
        }
    })
}

fn network_error(err: reqwest::Error) -> RollcallError {
    RollcallError::Transport(format!("Network error: {err}"))
}

/// Client for the attendance server.
pub struct AttendanceClient {
    client: Client,
    base_url: Url,
    flow: SubmitFlow,
}

impl AttendanceClient {
    #[instrument(level = "debug", skip_all, fields(
        server_url = %config.server_url,
        flow = %config.submit_flow,
        timeout_ms = config.request_timeout.as_millis() as u64
    ))]
    pub fn new(config: &KioskConfig) -> Result<Self> {
        let mut base = config.server_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            RollcallError::Config(format!("Invalid server URL '{}': {e}", config.server_url))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                RollcallError::Config(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("Attendance client created");
        Ok(Self {
            client,
            base_url,
            flow: config.submit_flow,
        })
    }

    pub fn flow(&self) -> SubmitFlow {
        self.flow
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RollcallError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Submit a frame and classify the answer. Never fails.
    #[instrument(level = "debug", skip(self, frame), fields(
        flow = %self.flow,
        bytes = frame.len(),
        filename = frame.filename()
    ))]
    pub async fn submit(&self, frame: FrameCapture) -> AttendanceOutcome {
        let start = Instant::now();
        let result = match self.flow {
            SubmitFlow::Multipart => self.submit_multipart(frame).await,
            SubmitFlow::Base64Json => self.submit_base64(frame).await,
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                info!(latency_ms, severity = %outcome.severity(), "Attendance submitted");
                outcome
            }
            Err(e) => {
                warn!(latency_ms, error = %e, "Attendance submission failed");
                AttendanceOutcome::TransportError {
                    message: match e {
                        RollcallError::Transport(message) => message,
                        other => other.to_string(),
                    },
                }
            }
        }
    }

    async fn submit_multipart(&self, frame: FrameCapture) -> Result<AttendanceOutcome> {
        let url = self.endpoint(MARK_ATTENDANCE_PATH)?;
        let filename = frame.filename().to_string();
        let content_type = frame.content_type().to_string();

        let part = multipart::Part::bytes(frame.into_bytes())
            .file_name(filename)
            .mime_str(&content_type)?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");
        let body = response.bytes().await.map_err(network_error)?;

        Ok(classify_mark(parse_body(status, &body)?))
    }

    async fn submit_base64(&self, frame: FrameCapture) -> Result<AttendanceOutcome> {
        let url = self.endpoint(PROCESS_ATTENDANCE_PATH)?;
        let frame_time = frame.local_time();
        let data_url = format!(
            "data:{};base64,{}",
            frame.content_type(),
            BASE64.encode(frame.bytes())
        );

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "image": data_url }))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");
        let body = response.bytes().await.map_err(network_error)?;

        Ok(classify_process(parse_body(status, &body)?, frame_time))
    }

    /// Today's attendance. An empty list is a normal answer.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_today(&self) -> Result<TodayAttendance> {
        let url = self.endpoint(TODAY_ATTENDANCE_PATH)?;
        let response = self.client.get(url).send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Today's attendance request failed");
            return Err(RollcallError::Transport(format!(
                "Attendance server returned status: {status}"
            )));
        }

        let body = response.bytes().await.map_err(network_error)?;
        let today: TodayAttendance = parse_body(status, &body)?;
        debug!(records = today.records.len(), "Fetched today's attendance");
        Ok(today)
    }

    /// CSV attendance sheet for `date` (server default: today).
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_export(&self, date: Option<NaiveDate>) -> Result<CsvExport> {
        let mut url = self.endpoint(DOWNLOAD_ATTENDANCE_PATH)?;
        if let Some(date) = date {
            url.query_pairs_mut()
                .append_pair("date", &date.format("%Y-%m-%d").to_string());
        }

        let response = self.client.get(url).send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;
        let export: DownloadResponse = parse_body(status, &body)?;

        if !export.success {
            return Err(RollcallError::ServerRejection(
                export
                    .message
                    .unwrap_or_else(|| "Error downloading attendance sheet".to_string()),
            ));
        }

        let filename = export.filename.unwrap_or_else(|| {
            let day = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            format!("attendance_{}.csv", day.format("%Y-%m-%d"))
        });
        let csv = export.csv_data.unwrap_or_default().into_bytes();
        debug!(%filename, bytes = csv.len(), "Fetched attendance export");
        Ok(CsvExport { filename, csv })
    }
}

#[async_trait]
impl AttendanceApi for AttendanceClient {
    async fn submit(&self, frame: FrameCapture) -> AttendanceOutcome {
        AttendanceClient::submit(self, frame).await
    }
}

/// Shorthand for a client with a custom timeout, mostly for tests.
pub fn client_for(server_url: &str, flow: SubmitFlow, timeout: Duration) -> Result<AttendanceClient> {
    AttendanceClient::new(&KioskConfig {
        server_url: server_url.to_string(),
        submit_flow: flow,
        request_timeout: timeout,
        ..KioskConfig::default()
    })
}
