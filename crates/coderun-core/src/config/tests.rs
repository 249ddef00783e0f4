//! Tests for configuration parsing, overrides and validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::language::Language;
    use serial_test::serial;
    use std::env;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{tempdir, NamedTempFile};

    fn clear_env() {
        env::remove_var(PYTHON_ENV);
        env::remove_var(DEFAULT_LANGUAGE_ENV);
    }

    #[test]
    #[serial]
    fn test_empty_config_uses_defaults() {
        clear_env();
        let config = ConfigLoader::from_str("", None).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.default_language, Language::JavaScript);
        assert_eq!(config.logging.level, "info");
        assert!(config.python.interpreter.is_none());
    }

    #[test]
    #[serial]
    fn test_full_config() {
        clear_env();
        let yaml = r#"
default_language: python
python:
  interpreter: /usr/bin/python3
  env:
    PYTHONHASHSEED: "0"
logging:
  level: debug
"#;
        let config = ConfigLoader::from_str(yaml, None).unwrap();
        assert_eq!(config.default_language, Language::Python);
        assert_eq!(
            config.python.interpreter,
            Some(PathBuf::from("/usr/bin/python3"))
        );
        assert_eq!(config.python.env.get("PYTHONHASHSEED").unwrap(), "0");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_yaml_is_a_config_error() {
        clear_env();
        let err = ConfigLoader::from_str("default_language: [", None).unwrap_err();
        assert!(matches!(err, crate::errors::RunnerError::ConfigError(_)));
    }

    #[test]
    #[serial]
    fn test_unknown_language_is_rejected() {
        clear_env();
        assert!(ConfigLoader::from_str("default_language: ruby", None).is_err());
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        clear_env();
        assert!(ConfigLoader::from_str("python:\n  interpreter: \"\"", None).is_err());
        assert!(ConfigLoader::from_str("logging:\n  level: loud", None).is_err());
        assert!(
            ConfigLoader::from_str("python:\n  asset_base: /definitely/not/here", None).is_err()
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_relative_asset_base_resolves_against_config_dir() {
        clear_env();
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pylib")).unwrap();
        let config_path = dir.path().join("coderun.yaml");
        std::fs::write(
            &config_path,
            "python:\n  asset_base: pylib\n  interpreter: python3\n",
        )
        .unwrap();

        let config = load_config(&config_path).await.unwrap();
        assert_eq!(config.python.asset_base, Some(dir.path().join("pylib")));
        assert_eq!(config.python.interpreter, Some(PathBuf::from("python3")));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_overrides_file_values() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_language: javascript").unwrap();
        writeln!(file, "python:\n  interpreter: /usr/bin/python3").unwrap();

        env::set_var(PYTHON_ENV, "/opt/python/bin/python3.12");
        env::set_var(DEFAULT_LANGUAGE_ENV, "py");
        let config = load_config(file.path()).await;
        clear_env();

        let config = config.unwrap();
        assert_eq!(
            config.python.interpreter,
            Some(PathBuf::from("/opt/python/bin/python3.12"))
        );
        assert_eq!(config.default_language, Language::Python);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_file() {
        clear_env();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");

        assert!(load_config(&missing).await.is_err());
        let config = load_config_or_default(&missing).await.unwrap();
        assert_eq!(config, RunnerConfig::default());
    }

    #[tokio::test]
    #[serial]
    async fn test_unreadable_location_is_an_io_error() {
        clear_env();
        let file = NamedTempFile::new().unwrap();
        // a path below a regular file can be neither found nor ruled out
        let path = file.path().join("config.yaml");

        let err = load_config_or_default(&path).await.unwrap_err();
        assert!(matches!(err, crate::errors::RunnerError::IoError(_)));
    }

    #[test]
    fn test_default_config_path_is_under_home() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(".coderun/config.yaml"));
        }
    }
}
