use plugin_studio_core::BackendError;
use plugin_studio_core::wire::error_message_from_body;
use serde::de::DeserializeOwned;

/// Maps a non-2xx status to an http error carrying the backend's own
/// message when the body has one.
pub(crate) fn check_status(status: u16, raw: &str) -> Result<(), BackendError> {
    if (200..=299).contains(&status) {
        return Ok(());
    }
    let message = error_message_from_body(raw)
        .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(BackendError::http(status, message))
}

pub(crate) fn decode_json_body<T: DeserializeOwned>(
    status: u16,
    raw: &str,
) -> Result<T, BackendError> {
    check_status(status, raw)?;
    serde_json::from_str(raw).map_err(|error| BackendError::decode(error.to_string()))
}

#[cfg(test)]
mod tests {
    use plugin_studio_core::BackendErrorKind;
    use plugin_studio_core::wire::ProjectsResponse;

    use super::*;

    #[test]
    fn success_bodies_decode() {
        let projects: ProjectsResponse =
            decode_json_body(200, r#"{"projects": ["Alpha", "Beta"]}"#).expect("decode");
        assert_eq!(projects.projects, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn error_status_uses_reply_text() {
        let error = decode_json_body::<ProjectsResponse>(500, r#"{"reply": "❌ Server error: x"}"#)
            .expect_err("server error");
        assert_eq!(error, BackendError::http(500, "❌ Server error: x"));
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        let error = check_status(404, "").expect_err("not found");
        assert_eq!(error.message, "request failed with status 404");
        assert!(check_status(204, "").is_ok());
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let error =
            decode_json_body::<ProjectsResponse>(200, "<html>").expect_err("not json");
        assert_eq!(error.kind, BackendErrorKind::Decode);
    }
}
