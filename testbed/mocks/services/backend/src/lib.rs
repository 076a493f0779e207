//! Mock execution backend for integration testing of the coderun transports
//!
//! This crate serves the same HTTP and WebSocket endpoints as the real sandboxed
//! runner, but "executes" a tiny line-based script language instead of real code
//! (see [`programs`]). Tests bind it to an ephemeral local port, point the real
//! clients at it, and inspect what the backend received afterwards. Failure modes
//! (HTTP 500, non-JSON bodies, slow responses) and both prompt encodings can be
//! switched on per instance.

pub mod fixtures;
pub mod handlers;
pub mod programs;
pub mod server;

pub use fixtures::{SnippetFixture, SnippetSeed};
pub use programs::{FakeProgram, Step};
pub use server::{FailureMode, InteractiveRecord, MockBackend, PromptStyle, RunningBackend};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixture_creation() {
        let fixture = SnippetFixture::create_test_fixture();
        let snippets = fixture.all();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].id, 1);
        assert_eq!(snippets[0].title, "Hello");
        assert_eq!(snippets[1].language_name, "Python");
    }

    #[test]
    fn test_fixture_from_yaml() {
        let fixture = SnippetFixture::from_yaml(
            r#"
- title: "Sum"
  code: "print 3"
  language: "C"
- title: "Shared"
  code: "print shared"
  language: "C++"
  is_public: true
"#,
        )
        .unwrap();

        let snippets = fixture.all();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[1].id, 2);
        assert!(snippets[1].is_public);
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = MockBackend::new().spawn().await.unwrap();

        let response = reqwest::get(format!("{}/health", backend.base_url()))
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_execute_endpoint() {
        let backend = MockBackend::new().spawn().await.unwrap();
        let client = reqwest::Client::new();

        let body: serde_json::Value = client
            .post(format!("{}/api/execute/execute/", backend.base_url()))
            .json(&json!({
                "code": "print(1)",
                "language_id": 1,
                "save_snippet": false,
                "snippet_title": "New Code",
                "user_input": ""
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["stdout"], "1\n");
        assert_eq!(backend.execution_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_language() {
        let backend = MockBackend::new().spawn().await.unwrap();
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/execute/execute/", backend.base_url()))
            .json(&json!({
                "code": "print(1)",
                "language_id": 9,
                "save_snippet": false,
                "snippet_title": "New Code",
                "user_input": ""
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 404);
    }
}
