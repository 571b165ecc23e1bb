use super::core::ConfigLoader;
use super::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_loads_defaults() {
    let config = SeedpoolConfig::load(None, None::<()>).expect("Should load default config");

    assert_eq!(config.job.max_steps, 256);
    assert!(!config.job.persistent_cache);
    assert_eq!(config.dispatch.max_memory_gb, 1.0);
    assert_eq!(config.dispatch.max_threads, 1);
    assert_eq!(config.dispatch.tick_interval_ms, 250);
    assert_eq!(config.executable.program, PathBuf::from("build/rosa"));
    assert_eq!(config.calibration.route, "paladin");
    assert_eq!(config.calibration.max_steps, 64);
}

#[test]
fn test_custom_config_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.yaml");
    fs::write(
        &path,
        "job:\n  route: paladin\n  max_segments: 3\ndispatch:\n  max_threads: 6\n",
    )
    .unwrap();

    let config = SeedpoolConfig::load(Some(&path), None::<()>).unwrap();
    assert_eq!(config.job.route.as_deref(), Some("paladin"));
    assert_eq!(config.job.max_segments, Some(3));
    assert_eq!(config.dispatch.max_threads, 6);
    // Untouched keys keep their defaults
    assert_eq!(config.job.max_steps, 256);
}

#[test]
fn test_missing_custom_config_is_an_error() {
    let result = SeedpoolConfig::load(Some(Path::new("does/not/exist.toml")), None::<()>);
    assert!(result.is_err());
}

#[test]
fn test_cli_overrides_win_and_unset_flags_do_not() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, "[dispatch]\nmax_threads = 6\nmax_memory_gb = 3.5\n").unwrap();

    let overrides = json!({
        "dispatch": { "max_threads": 2, "max_memory_gb": null },
        "job": { "route": "moon" },
    });

    let config = SeedpoolConfig::load(Some(&path), Some(overrides)).unwrap();
    assert_eq!(config.dispatch.max_threads, 2);
    assert_eq!(config.dispatch.max_memory_gb, 3.5);
    assert_eq!(config.route().unwrap(), "moon");
}

#[test]
fn test_get_section() {
    let loader = ConfigLoader::load(None, None::<()>).unwrap();
    let section = loader.get_section("executable").unwrap();
    assert_eq!(section["time_wrapper"], json!("/usr/bin/time"));
    assert!(loader.get_full_config().unwrap().get("calibration").is_some());
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = SeedpoolConfig::default();
    assert!(config.validate().is_ok());

    config.dispatch.max_memory_gb = -1.0;
    assert!(config.validate().is_err());

    config.dispatch.max_memory_gb = 1.0;
    config.dispatch.tick_interval_ms = 0;
    assert!(config.validate().is_err());

    config.dispatch.tick_interval_ms = 250;
    config.job.max_steps = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_route_is_required() {
    let mut config = SeedpoolConfig::default();
    assert!(config.route().is_err());

    config.job.route = Some("   ".to_string());
    assert!(config.route().is_err());

    config.job.route = Some("paladin".to_string());
    assert_eq!(config.route().unwrap(), "paladin");
}

#[test]
fn test_resolved_max_threads() {
    let mut dispatch = DispatchConfig::default();
    dispatch.max_threads = 4;
    assert_eq!(dispatch.resolved_max_threads(), 4);

    dispatch.max_threads = 0;
    assert!(dispatch.resolved_max_threads() >= 1);
}
