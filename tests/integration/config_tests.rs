//! Configuration integration tests
//!
//! Loading YAML files and rejecting invalid settings.

#[cfg(test)]
mod tests {
    use community_hub::config::{Config, LogFormat};
    use community_hub::core::counters::presets;
    use community_hub::{Capability, HubError};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
backend:
  url: "https://project.example.co/"
  anon_key: "anon-key"
  schema: community
realtime:
  heartbeat_interval_secs: 15
  channel_capacity: 16
session:
  impersonation_key: admin_impersonation_role
  state_file: /var/lib/hub/session.json
retry:
  max_retries: 2
  initial_delay_ms: 250
  max_delay_ms: 2000
  max_jitter_ms: 0
counters:
  - name: pending_vendors
    collection: vendors
    filters:
      - column: status
        op: eq
        value: pending
    required: manage_vendors
  - name: open_alerts
    collection: health_alerts
    filters:
      - column: status
        op: eq
        value: open
    required: view_health_alerts
logging:
  level: "community_hub=debug"
  format: json
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// Every section of a complete file is honoured
    #[tokio::test]
    async fn test_full_config_file() {
        let file = write_config(FULL_CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();

        assert_eq!(config.backend.base_url(), "https://project.example.co");
        assert_eq!(config.backend.schema, "community");
        assert_eq!(config.realtime.channel_capacity, 16);
        assert_eq!(
            config.session.state_file,
            PathBuf::from("/var/lib/hub/session.json")
        );
        assert_eq!(config.retry.to_options().max_attempts(), 3);
        assert_eq!(config.logging.format, LogFormat::Json);

        assert_eq!(config.counters.len(), 2);
        assert_eq!(config.counters[1].name, "open_alerts");
        assert_eq!(config.counters[1].required, Capability::ViewHealthAlerts);
        assert_eq!(
            config.counters[1].query().filters[0].to_query_value(),
            "eq.open"
        );
    }

    /// Omitting counters keeps the built-in badges
    #[test]
    fn test_default_counters() {
        let config = Config::from_yaml("backend:\n  url: https://x.example.co\n  anon_key: k\n")
            .unwrap();
        let names: Vec<_> = config.counters.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names.len(), 4);
        assert!(names.iter().any(|n| n == presets::HEALTH_ALERTS));
        assert!(config.validate().is_ok());
    }

    /// Invalid files fail validation with a config error
    #[test]
    fn test_validation_failures() {
        let cases = [
            // Duplicate counter names
            r#"
counters:
  - {name: a, collection: vendors, required: manage_vendors}
  - {name: a, collection: health_alerts, required: view_health_alerts}
"#,
            // Unparseable URL
            "backend:\n  url: \"not a url\"\n  anon_key: k\n",
            // Backoff window inverted
            "retry:\n  initial_delay_ms: 5000\n  max_delay_ms: 100\n",
            // Collection is not an identifier
            "counters:\n  - {name: x, collection: \"vendors; drop\", required: manage_vendors}\n",
            // URL without a key
            "backend:\n  url: https://x.example.co\n",
        ];

        for yaml in cases {
            let config = Config::from_yaml(yaml).unwrap();
            let result = config.validate();
            assert!(
                matches!(result, Err(HubError::Config(_))),
                "expected rejection for:\n{}",
                yaml
            );
        }
    }

    /// Unknown capabilities are a parse error
    #[test]
    fn test_unknown_capability() {
        let result = Config::from_yaml(
            "counters:\n  - {name: x, collection: vendors, required: launch_rockets}\n",
        );
        assert!(matches!(result, Err(HubError::Config(_))));
    }

    /// An explicitly named file that does not exist is an error
    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.yaml"))).await;
        assert!(matches!(result, Err(HubError::Config(msg)) if msg.contains("absent.yaml")));
    }

    /// Counters may watch a schema of their own
    #[test]
    fn test_counter_schema() {
        let config = Config::from_yaml(
            "counters:\n  - {name: x, collection: flags, required: admin_access, schema: audit}\n",
        )
        .unwrap();
        assert_eq!(config.counters[0].change_filter().schema, "audit");
        assert!(config.validate().is_ok());

        let config = Config::from_yaml(
            "counters:\n  - {name: x, collection: flags, required: admin_access, schema: \"a b\"}\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    /// YAML output parses back into the same settings
    #[tokio::test]
    async fn test_show_output_reloads() {
        let file = write_config(FULL_CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();

        let reloaded = Config::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded.counters, config.counters);
        assert_eq!(reloaded.retry, config.retry);
        assert_eq!(reloaded.backend.url, config.backend.url);
    }
}
