//! Type definitions for the remote code execution backend contract
//!
//! This crate provides the shared contract between the execution client and the
//! sandboxed runner: the one-shot request/response bodies, the JSON frames exchanged
//! over the interactive channel, the language table and the snippet payloads. Keeping
//! these definitions in one place lets the transport layer, the session core and the
//! mock backend used in tests agree on the exact wire shape.
//!
//! ## Features
//!
//! - **Language table**: display names resolved to backend identifiers before any call
//! - **One-shot bodies**: `ExecuteRequest` / `ExecuteResponse` with the display rule
//! - **Channel frames**: tagged outbound actions and field-presence inbound frames
//! - **Snippets**: create and list payloads for snippet persistence
//!
//! ## Example
//!
//! ```rust
//! use coderun_types::{ExecuteRequest, Language};
//!
//! let language = Language::from_display_name("C++").unwrap();
//! let request = ExecuteRequest::new("int main() {}", language);
//!
//! assert_eq!(request.language_id, 3);
//! ```

pub mod channel;
pub mod error;
pub mod execution;
pub mod language;
pub mod snippet;

pub use channel::*;
pub use error::*;
pub use execution::*;
pub use language::*;
pub use snippet::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execute_request_wire_shape() {
        let request = ExecuteRequest::new("print(1)", Language::Python).with_user_input("5\n");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "code": "print(1)",
                "language_id": 1,
                "save_snippet": false,
                "snippet_title": "New Code",
                "user_input": "5\n"
            })
        );
    }

    #[test]
    fn test_start_frame_uses_lowercase_language() {
        let frame = ClientFrame::start(Language::Cpp, "int main() {}");
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(
            value,
            json!({"action": "start", "language": "c++", "code": "int main() {}"})
        );
    }

    #[test]
    fn test_input_frame() {
        let frame = ClientFrame::input("5");
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"action":"input","data":"5"}"#
        );
    }

    #[test]
    fn test_server_frame_field_presence() {
        let frame: ServerFrame = serde_json::from_str(r#"{"prompt":"Enter n:"}"#).unwrap();
        assert_eq!(frame.output, None);
        assert_eq!(frame.prompt.as_deref(), Some("Enter n:"));
        assert_eq!(frame.error, None);
        assert!(!frame.is_empty());

        let empty: ServerFrame = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_snippet_response_parsing() {
        let snippet: Snippet = serde_json::from_value(json!({
            "id": 7,
            "title": "Hello",
            "code": "print('hi')",
            "language_name": "Python",
            "is_public": false,
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(snippet.id, 7);
        assert_eq!(snippet.language().unwrap(), Language::Python);
    }
}
