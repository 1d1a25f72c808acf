use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = VgirConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, VgirConfig::default());
    assert_eq!(cfg.pool.buffer_size, 4096);
    assert_eq!(cfg.cache.unused_cycle_threshold, 8);
    assert!(!cfg.canvas.heap_profiling);
}

#[test]
fn sections_override_defaults() {
    let cfg = VgirConfig::from_json_str(
        r#"{ "pool": { "buffer_size": 256 }, "canvas": { "heap_profiling": true } }"#,
    )
    .unwrap();
    assert_eq!(cfg.pool.buffer_size, 256);
    assert!(cfg.canvas.heap_profiling);
    assert_eq!(cfg.cache.unused_cycle_threshold, 8);
}

#[test]
fn rejects_unknown_sections() {
    let err = VgirConfig::from_json_str(r#"{ "gpu": {} }"#).unwrap_err();
    assert!(matches!(err, VgirError::Argument(_)));
}

#[test]
fn rejects_tiny_buffers_and_zero_threshold() {
    assert!(VgirConfig::from_json_str(r#"{ "pool": { "buffer_size": 8 } }"#).is_err());
    assert!(
        VgirConfig::from_json_str(r#"{ "cache": { "unused_cycle_threshold": 0 } }"#).is_err()
    );
}

#[test]
fn missing_file_is_an_argument_error() {
    let err = VgirConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("open config JSON"));
}
