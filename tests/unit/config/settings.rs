use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = TwibbonConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, TwibbonConfig::default());
    assert_eq!(cfg.controller_width, 250.0);
    assert_eq!(cfg.face_padding, 3.5);
    assert_eq!(cfg.max_scale, 500.0);
}

#[test]
fn partial_override_keeps_other_defaults() {
    let cfg = TwibbonConfig::from_json_str(r#"{"face_padding": 2.0}"#).unwrap();
    assert_eq!(cfg.face_padding, 2.0);
    assert_eq!(cfg.analysis_max_edge, 600);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(
        TwibbonConfig::from_json_str(r#"{"controller_width": 0}"#),
        Err(TwibbonError::Validation(_))
    ));
    assert!(matches!(
        TwibbonConfig::from_json_str(r#"{"min_scale": 10, "max_scale": 5}"#),
        Err(TwibbonError::Validation(_))
    ));
    assert!(matches!(
        TwibbonConfig::from_json_str("not json"),
        Err(TwibbonError::Serde(_))
    ));
}

#[test]
fn clamp_scale_respects_limits() {
    let cfg = TwibbonConfig::default();
    assert_eq!(cfg.clamp_scale(-5.0), 0.0);
    assert_eq!(cfg.clamp_scale(650.0), 500.0);
    assert_eq!(cfg.clamp_scale(120.0), 120.0);
    assert_eq!(cfg.clamp_scale(f64::NAN), 0.0);
}

#[test]
fn render_threads_must_be_positive() {
    let cfg = TwibbonConfig::from_json_str(r#"{"render_threads": 2}"#).unwrap();
    assert_eq!(cfg.render_threads, Some(2));
    assert!(TwibbonConfig::from_json_str(r#"{"render_threads": 0}"#).is_err());
}
