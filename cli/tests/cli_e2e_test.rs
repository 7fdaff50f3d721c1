use assert_cmd::{Command, cargo_bin_cmd};
use std::io::Write;
use tempfile::NamedTempFile;

fn agent() -> Command {
    let mut cmd = cargo_bin_cmd!("agent");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn document(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

mod help_and_version {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_version_flag() {
        agent()
            .arg("-version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("agent, version "));
    }

    #[test]
    fn test_version_double_dash() {
        agent()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_help_flag() {
        agent()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--config.file"))
            .stdout(predicate::str::contains("--prometheus.wal-directory"));
    }
}

mod resolve {
    use super::*;
    use predicates::prelude::PredicateBooleanExt;
    use predicates::prelude::predicate;

    #[test]
    fn test_missing_config_file() {
        agent()
            .assert()
            .failure()
            .stderr(predicate::str::contains("-config.file flag required"));
    }

    #[test]
    fn test_unreadable_config_file() {
        agent()
            .args(["-config.file", "/nonexistent/agent.yaml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error reading config file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_config_file_argument() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        agent()
            .arg("-config.file")
            .arg(OsString::from_vec(b"/nonexistent/agent-\xff.yaml".to_vec()))
            .assert()
            .failure()
            .stderr(predicate::str::contains("error reading config file"));
    }

    #[test]
    fn test_prints_resolved_config() {
        let file = document(
            "prometheus:\n  wal_directory: /tmp/wal\n  global:\n    scrape_timeout: 33s\n",
            ".yaml"
        );

        agent()
            .arg("-config.file")
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("wal_directory: /tmp/wal"))
            .stdout(predicate::str::contains("scrape_timeout: 33s"))
            .stdout(predicate::str::contains("http_listen_port: 80"));
    }

    #[test]
    fn test_flag_overrides_document() {
        let file = document("prometheus:\n  wal_directory: /tmp/wal\n", ".yaml");

        agent()
            .arg("--config.file")
            .arg(file.path())
            .args(["--prometheus.wal-directory", "/data/wal"])
            .assert()
            .success()
            .stdout(predicate::str::contains("wal_directory: /data/wal"))
            .stdout(predicate::str::contains("/tmp/wal").not());
    }

    #[test]
    fn test_expands_environment() {
        let file = document(
            "prometheus:\n  wal_directory: ${AGENT_TEST_WAL_DIR}\n",
            ".yaml"
        );

        agent()
            .arg("-config.file")
            .arg(file.path())
            .arg("-config.expand-env")
            .env("AGENT_TEST_WAL_DIR", "/from/env")
            .assert()
            .success()
            .stdout(predicate::str::contains("wal_directory: /from/env"));
    }

    #[test]
    fn test_toml_document() {
        let file = document("[prometheus]\nwal_directory = \"/tmp/toml-wal\"\n", ".toml");

        agent()
            .arg("-config.file")
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("wal_directory: /tmp/toml-wal"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = document("prometheus:\n  wal_dir: /tmp/wal\n", ".yaml");

        agent()
            .arg("-config.file")
            .arg(file.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("error loading config file"))
            .stderr(predicate::str::contains("wal_dir"));
    }

    #[test]
    fn test_deprecated_loki_section() {
        let file = document(
            r#"
loki:
  configs:
  - name: default
    positions:
      filename: /tmp/positions.yaml
    clients:
    - url: http://loki:3100/loki/api/v1/push
"#,
            ".yaml"
        );

        agent()
            .arg("-config.file")
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\nlogs:"))
            .stdout(predicate::str::contains("\nloki:").not())
            .stderr(predicate::str::contains(
                "DEPRECATION NOTICE: `loki` is deprecated in favor of `logs`"
            ));
    }

    #[test]
    fn test_missing_reference() {
        let file = document(
            r#"
tempo:
  configs:
  - name: default
    spanmetrics:
      metrics_instance: missing
"#,
            ".yaml"
        );

        agent()
            .arg("-config.file")
            .arg(file.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "error in config file: failed to validate spanmetrics for tempo config default"
            ));
    }
}
