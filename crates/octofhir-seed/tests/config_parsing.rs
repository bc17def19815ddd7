use std::{env, fs};

use octofhir_seed::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("octofhir-seed.toml");

    let toml_content = r#"
[server]
base_url = "http://fhir.example.org:8080/fhir"
connect_timeout_ms = 2000

[import]
data_dir = "fixtures/mock"
order = ["Patient", "DocumentReference", "Task"]

[registrar]
reindex_delay_ms = 500

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses, unspecified keys keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.base_url, "http://fhir.example.org:8080/fhir");
    assert_eq!(cfg.server.connect_timeout_ms, 2000);
    assert_eq!(cfg.server.request_timeout_ms, 10_000);
    assert_eq!(cfg.import.order, vec!["Patient", "DocumentReference", "Task"]);
    assert_eq!(cfg.import.patient_trigger, "Patient");
    assert_eq!(cfg.registrar.reindex_delay_ms, 500);
    assert_eq!(cfg.registrar.verify_attempts, 1);
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("OCTOFHIR_SEED__REGISTRAR__VERIFY_ATTEMPTS", "4");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.registrar.verify_attempts, 4);
    unsafe {
        env::remove_var("OCTOFHIR_SEED__REGISTRAR__VERIFY_ATTEMPTS");
    }

    // 3) Invalid config (trigger not in order) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[import]
order = ["DocumentReference", "Task"]
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("patient_trigger"));

    // 4) Explicit path that does not exist is an error
    let missing = dir.path().join("missing.toml");
    assert!(load_config(missing.to_str()).is_err());
}
