use random_slideshow::config::{Configuration, SamplerKind};
use random_slideshow::presenter::Viewport;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
show-folder-path: "/photos"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.show_folder_path, PathBuf::from("/photos"));
    assert_eq!(cfg.exposure(), Duration::from_secs(7));
    assert!(cfg.logging_enabled);
    assert_eq!(cfg.sampler, SamplerKind::List);
    assert_eq!(cfg.attempt_delay, Duration::from_millis(100));
    assert_eq!(cfg.index_warmup, Duration::from_secs(5));
    assert!(cfg.allow_upscale);
    assert_eq!(Viewport::from(cfg.viewport), Viewport::new(1920, 1080));
}

#[test]
fn parse_full_config() {
    let yaml = r#"
show-folder-path: "/p"
exposure-seconds: 3
logging-enabled: false
sampler: walk
attempt-delay: 250ms
index-warmup: 1s
max-walk-depth: 12
allow-upscale: false
viewport:
  width: 800
  height: 480
rng-seed: 7
log-file: "/var/log/slideshow.log"
"#;
    let cfg = serde_yaml::from_str::<Configuration>(yaml)
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.exposure(), Duration::from_secs(3));
    assert!(!cfg.logging_enabled);
    assert_eq!(cfg.sampler, SamplerKind::Walk);
    assert_eq!(cfg.attempt_delay, Duration::from_millis(250));
    assert_eq!(cfg.index_warmup, Duration::from_secs(1));
    assert_eq!(cfg.max_walk_depth, 12);
    assert!(!cfg.allow_upscale);
    assert_eq!(Viewport::from(cfg.viewport), Viewport::new(800, 480));
    assert_eq!(cfg.rng_seed, Some(7));
    assert_eq!(cfg.log_file, Some(PathBuf::from("/var/log/slideshow.log")));
}

#[test]
fn unknown_keys_are_rejected() {
    let yaml = r#"
show-folder-path: "/p"
shuffle: true
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn zero_exposure_is_invalid() {
    let yaml = r#"
show-folder-path: "/p"
exposure-seconds: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("exposure-seconds"));
}

#[test]
fn zero_viewport_is_invalid() {
    let yaml = r#"
show-folder-path: "/p"
viewport:
  width: 0
  height: 10
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "show-folder-path: /pics\nsampler: list\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.show_folder_path, PathBuf::from("/pics"));
}
