//! Configuration loading tests

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::SessionError;
    use crate::session::ExecutionMode;
    use serial_test::serial;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn clear_environment() {
        std::env::remove_var(ENV_BASE_URL);
        std::env::remove_var(ENV_INTERACTIVE_URL);
        std::env::remove_var(ENV_LOG_LEVEL);
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_environment();
        let config = ConfigLoader::from_str("").unwrap();

        assert_eq!(config, CoderunConfig::default());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.execute_path, "/api/execute/execute/");
        assert_eq!(config.session.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.input_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.session.default_mode, ExecutionMode::OneShot);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_from_file() {
        clear_environment();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
backend:
  base_url: "https://runner.example.com"
session:
  default_language: "C++"
  default_mode: "interactive"
  input_timeout_secs: 0
logging:
  level: "debug"
"#
        )
        .unwrap();

        let config = load_config(file.path()).await.unwrap();
        assert_eq!(config.backend.base_url, "https://runner.example.com");
        assert_eq!(
            config.backend.interactive_endpoint(),
            "wss://runner.example.com/ws/interactive/"
        );
        assert_eq!(config.session.default_language, "C++");
        assert_eq!(config.session.default_mode, ExecutionMode::Interactive);
        assert_eq!(config.session.input_timeout(), None);
        assert_eq!(config.session.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_file_is_an_error() {
        let result = load_config("/nonexistent/coderun/config.yaml").await;
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_interactive_endpoint_derivation() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.interactive_endpoint(), "ws://localhost:8000/ws/interactive/");

        backend.base_url = "http://10.0.0.5:9000/".to_string();
        assert_eq!(backend.interactive_endpoint(), "ws://10.0.0.5:9000/ws/interactive/");

        backend.interactive_url = Some("ws://elsewhere/socket".to_string());
        assert_eq!(backend.interactive_endpoint(), "ws://elsewhere/socket");
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_environment();
        std::env::set_var(ENV_BASE_URL, "http://override:8000");
        std::env::set_var(ENV_INTERACTIVE_URL, "ws://override:8001/ws/interactive/");

        let config = ConfigLoader::from_str("backend:\n  base_url: \"http://file:8000\"\n");
        clear_environment();

        let config = config.unwrap();
        assert_eq!(config.backend.base_url, "http://override:8000");
        assert_eq!(
            config.backend.interactive_endpoint(),
            "ws://override:8001/ws/interactive/"
        );
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        clear_environment();

        let cases = [
            "backend:\n  base_url: \"ftp://runner\"\n",
            "backend:\n  interactive_url: \"http://runner/ws/\"\n",
            "backend:\n  execute_path: \"api/execute/\"\n",
            "session:\n  default_language: \"Java\"\n",
            "session:\n  connect_timeout_secs: 0\n",
            "session:\n  request_timeout_secs: 0\n",
            "logging:\n  level: \"loud\"\n",
        ];

        for yaml in cases {
            let result = ConfigLoader::from_str(yaml);
            assert!(
                matches!(result, Err(SessionError::Config(_))),
                "expected rejection for {:?}",
                yaml
            );
        }
    }

    #[test]
    #[serial]
    fn test_yaml_round_trip() {
        clear_environment();
        let config = CoderunConfig::default();
        let yaml = ConfigLoader::to_yaml(&config).unwrap();
        assert!(yaml.contains("localhost:8000"));
        assert_eq!(ConfigLoader::from_str(&yaml).unwrap(), config);
    }
}
