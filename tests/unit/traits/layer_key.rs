use super::*;

#[test]
fn all_is_listed_in_non_decreasing_rank_order() {
    let table = LayerOrderTable::standard();
    for pair in LayerKey::ALL.windows(2) {
        assert!(
            table.rank(pair[0]) <= table.rank(pair[1]),
            "{} should not paint after {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn names_round_trip_and_match_serde() {
    for key in LayerKey::ALL {
        assert_eq!(LayerKey::from_name(key.as_str()), Some(key));
        let v = serde_json::to_value(key).unwrap();
        assert_eq!(v, serde_json::Value::String(key.as_str().to_owned()));
    }
    assert_eq!(LayerKey::from_name("tail"), None);
}

#[test]
fn shared_planes() {
    let t = LayerOrderTable::standard();
    assert_eq!(t.rank(LayerKey::Body), t.rank(LayerKey::Bottom));
    assert_eq!(t.rank(LayerKey::Body), t.rank(LayerKey::Shoes));
    assert_eq!(t.rank(LayerKey::Head), t.rank(LayerKey::Beard));
}

#[test]
fn occlusion_rules() {
    let t = LayerOrderTable::standard();
    // Witch hat parts interleave with the base figure.
    assert!(t.rank(LayerKey::WitchHatBack) < t.rank(LayerKey::Body));
    assert!(t.rank(LayerKey::Head) < t.rank(LayerKey::WitchHatFront1));
    assert!(t.rank(LayerKey::WitchHatFront1) < t.rank(LayerKey::Face));
    assert!(t.rank(LayerKey::Face) < t.rank(LayerKey::WitchHatFront3));
    // Full-coverage headwear hides the right ear.
    assert!(t.rank(LayerKey::EarRightBehindHeadwear) < t.rank(LayerKey::HairHatBack));
    // Glasses go over a mask only when lifted.
    assert!(t.rank(LayerKey::Accessory1) < t.rank(LayerKey::Accessory2));
    assert!(t.rank(LayerKey::Accessory2) < t.rank(LayerKey::Accessory1OverMask));
    // Backpack straps wrap the figure.
    assert!(t.rank(LayerKey::Accessory3Back) < t.rank(LayerKey::Body));
    assert!(t.rank(LayerKey::Accessory3Front) > t.rank(LayerKey::ArmLeft));
}

#[test]
fn overrides_replace_single_rank() {
    let t = LayerOrderTable::standard().with_override(LayerKey::WitchHatFront1, 80);
    assert_eq!(t.rank(LayerKey::WitchHatFront1), 80);
    assert_eq!(t.rank(LayerKey::Face), LayerKey::Face.standard_rank());
}
