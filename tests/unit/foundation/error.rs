use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        AnimError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        AnimError::missing_base_trait("x")
            .to_string()
            .contains("missing base trait:")
    );
    assert!(
        AnimError::asset_load("x")
            .to_string()
            .contains("asset load error:")
    );
    assert!(AnimError::encoder("x").to_string().contains("encoder error:"));
    assert!(
        AnimError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(AnimError::RecordingBusy.to_string().contains("already active"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AnimError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: AnimError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, AnimError::Serde(_)));
}
