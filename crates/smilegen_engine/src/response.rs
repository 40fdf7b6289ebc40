//! Interpretation of the service's JSON payloads.
//!
//! The emotion editor answers with an inline image under `data.image`; some
//! deployments answer with a hosted result URL or with a job id that has to be
//! polled. Each shape is recognised by the fields it carries.

use serde_json::Value;

use crate::{ClientError, DataUrl, FailureKind, ResultImage};

const URL_KEYS: [&str; 3] = ["result_url", "image_url", "url"];
const JOB_KEYS: [&str; 3] = ["job_id", "task_id", "id"];
const NESTED: [&str; 2] = ["data", "result"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmitShape {
    Image(ResultImage),
    Job(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollStatus {
    Done(ResultImage),
    Failed(String),
    Pending,
}

pub(crate) fn parse_body(bytes: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice(bytes)
        .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))
}

pub(crate) fn parse_submit(body: &Value) -> Result<SubmitShape, ClientError> {
    check_error_code(body)?;
    if let Some(image) = extract_image(body) {
        return Ok(SubmitShape::Image(image));
    }
    if let Some(job_id) = find_job_id(body) {
        return Ok(SubmitShape::Job(job_id));
    }
    Err(ClientError::new(
        FailureKind::InvalidResponse,
        "No image data found in API response",
    ))
}

pub(crate) fn parse_poll(body: &Value) -> Result<PollStatus, ClientError> {
    check_error_code(body)?;
    let status = body
        .get("status")
        .or_else(|| body.get("data").and_then(|data| data.get("status")))
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);
    match status.as_deref() {
        Some("completed") | Some("success") => extract_image(body)
            .map(PollStatus::Done)
            .ok_or_else(|| {
                ClientError::new(FailureKind::InvalidResponse, "No valid URL found in response")
            }),
        Some("failed") | Some("error") => Ok(PollStatus::Failed(
            message_from(body).unwrap_or_else(|| "Processing failed on server".to_string()),
        )),
        _ => Ok(PollStatus::Pending),
    }
}

/// Best human-readable message in an error body, if it is JSON.
pub(crate) fn message_from_text(text: &str) -> Option<String> {
    let body: Value = serde_json::from_str(text).ok()?;
    message_from(&body)
}

fn message_from(body: &Value) -> Option<String> {
    ["error_msg", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

/// A present, non-zero `error_code` marks a payload-level failure.
fn check_error_code(body: &Value) -> Result<(), ClientError> {
    let Some(code) = body.get("error_code") else {
        return Ok(());
    };
    let ok = match code {
        Value::Number(number) => number.as_i64() == Some(0),
        Value::String(text) => text.trim() == "0",
        Value::Null => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ClientError::new(
            FailureKind::Api { status: None },
            message_from(body).unwrap_or_else(|| "API processing failed".to_string()),
        ))
    }
}

fn extract_image(body: &Value) -> Option<ResultImage> {
    if let Some(image) = body
        .get("data")
        .and_then(|data| data.get("image"))
        .and_then(Value::as_str)
        .filter(|image| !image.is_empty())
    {
        return Some(ResultImage::Inline(DataUrl::normalize(image)));
    }
    URL_KEYS.iter().find_map(|key| {
        lookup(body, key)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| ResultImage::Remote(url.to_string()))
    })
}

fn find_job_id(body: &Value) -> Option<String> {
    JOB_KEYS.iter().find_map(|key| match lookup(body, key)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

/// Looks for `key` at top level, then under `data` and `result`.
fn lookup<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|value| !value.is_null()).or_else(|| {
        NESTED
            .iter()
            .find_map(|outer| body.get(*outer)?.get(key).filter(|value| !value.is_null()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_image_wins_over_job_id() {
        let body = json!({"error_code": 0, "data": {"image": "AAEC", "task_id": "t-1"}});
        assert_eq!(
            parse_submit(&body).unwrap(),
            SubmitShape::Image(ResultImage::Inline(DataUrl::normalize("AAEC")))
        );
    }

    #[test]
    fn nested_url_is_found() {
        let body = json!({"result": {"image_url": "https://cdn.example.com/a.jpg"}});
        assert_eq!(
            parse_submit(&body).unwrap(),
            SubmitShape::Image(ResultImage::Remote("https://cdn.example.com/a.jpg".to_string()))
        );
    }

    #[test]
    fn numeric_job_id_is_stringified() {
        let body = json!({"data": {"job_id": 42}});
        assert_eq!(parse_submit(&body).unwrap(), SubmitShape::Job("42".to_string()));
    }

    #[test]
    fn non_zero_error_code_carries_server_message() {
        let body = json!({"error_code": 1001, "error_msg": "No face detected"});
        let err = parse_submit(&body).unwrap_err();
        assert_eq!(err.kind, FailureKind::Api { status: None });
        assert_eq!(err.message, "No face detected");
    }

    #[test]
    fn empty_payload_is_invalid() {
        let err = parse_submit(&json!({"error_code": 0})).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn poll_statuses() {
        assert_eq!(parse_poll(&json!({"status": "processing"})).unwrap(), PollStatus::Pending);
        assert_eq!(
            parse_poll(&json!({"status": "failed"})).unwrap(),
            PollStatus::Failed("Processing failed on server".to_string())
        );
        assert_eq!(
            parse_poll(&json!({"status": "SUCCESS", "url": "https://x/y.jpg"})).unwrap(),
            PollStatus::Done(ResultImage::Remote("https://x/y.jpg".to_string()))
        );
    }
}
