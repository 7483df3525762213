use super::*;
use crate::traits::dictionary::{InMemoryDictionarySource, TraitDictionaries};
use crate::traits::metadata::TraitAttribute;
use serde_json::json;

fn dicts() -> TraitDictionaries {
    let source = InMemoryDictionarySource::new()
        .with(
            "skin",
            json!({
                "light": {
                    "body": "skin/light/body.png",
                    "arm-left": "skin/light/arm-left.png",
                    "arm-right": "skin/light/arm-right.png",
                    "ear-left": "skin/light/ear-left.png",
                    "ear-right": "skin/light/ear-right.png",
                    "head": "skin/light/head.png",
                    "face": "skin/light/face.png"
                }
            }),
        )
        .with(
            "top",
            json!({ "Red Hoodie": ["top/red-hoodie-1.png", "top/red-hoodie-2.png", "top/red-hoodie-3.png"] }),
        )
        .with("bottom", json!({ "Jeans": "bottom/jeans.png" }))
        .with("suit", json!({ "Astronaut Suit": "suit/astronaut.png" }))
        .with("shoes", json!({ "Red  High Tops": "shoes/red-high-tops.png" }))
        .with(
            "hair-hat",
            json!({
                "Witch Hat": ["hat/witch-1.png", "hat/witch-2.png", "hat/witch-3.png", "hat/witch-4.png"],
                "Space Helmet": ["hat/space-1.png", "hat/space-2.png"],
                "Cap": "hat/cap.png"
            }),
        )
        .with(
            "accessory-1",
            json!({ "Round Glasses": "acc1/round.png", "Pen": "acc1/pen.png" }),
        )
        .with(
            "accessory-2",
            json!({ "Gas Mask": "acc2/gas-mask.png", "Full Beard": "acc2/beard.png", "Scarf": "acc2/scarf.png" }),
        )
        .with(
            "accessory-3",
            json!({
                "Bag Backpack Red": ["acc3/backpack-red-1.png", "acc3/backpack-red-2.png", "acc3/backpack-red-3.png"],
                "Leather Purse": "acc3/purse.png"
            }),
        );
    TraitDictionaries::load(&source)
}

fn meta(attrs: &[(&str, &str)]) -> TokenMetadata {
    TokenMetadata::from_attributes(
        attrs
            .iter()
            .map(|(t, v)| TraitAttribute::text(*t, *v))
            .collect(),
    )
}

fn keys(stack: &LayerStack) -> Vec<LayerKey> {
    stack.layers().iter().map(|l| l.key).collect()
}

#[test]
fn base_only_token_yields_base_layers() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[("Skin", "Light Skin - Light")]))
        .unwrap();

    assert_eq!(stack.len(), 7);
    assert!(stack.is_sorted());
    assert!(stack.layers().iter().all(|l| l.tag.starts_with("skin:")));
    assert_eq!(
        keys(&stack),
        vec![
            LayerKey::Body,
            LayerKey::ArmRight,
            LayerKey::EarLeft,
            LayerKey::Head,
            LayerKey::Face,
            LayerKey::EarRight,
            LayerKey::ArmLeft,
        ]
    );
}

#[test]
fn missing_or_unknown_skin_aborts() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let resolver = TraitResolver::new(&d, &order);

    let err = resolver.resolve(&meta(&[("Top", "Red Hoodie")])).unwrap_err();
    assert!(matches!(err, AnimError::MissingBaseTrait(_)));

    let err = resolver
        .resolve(&meta(&[("Skin", "Olive Skin - Olive")]))
        .unwrap_err();
    assert!(matches!(err, AnimError::MissingBaseTrait(_)));
}

#[test]
fn backpack_in_accessory_two_goes_to_accessory_three_parts() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Accessory 2", "Bag Backpack Red"),
        ]))
        .unwrap();

    let acc: Vec<_> = stack
        .layers()
        .iter()
        .filter(|l| l.tag.starts_with("accessory-"))
        .collect();
    assert_eq!(acc.len(), 3);
    assert_eq!(acc[0].key, LayerKey::Accessory3Back);
    assert_eq!(acc[1].key, LayerKey::Accessory3Middle);
    assert_eq!(acc[2].key, LayerKey::Accessory3Front);
    assert!(
        stack
            .layers()
            .iter()
            .all(|l| l.rank != LayerKey::Accessory2.standard_rank())
    );
    assert!(stack.is_sorted());
}

#[test]
fn single_bag_uses_accessory_three_rank() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Accessory 2", "Leather Purse"),
        ]))
        .unwrap();
    assert!(keys(&stack).contains(&LayerKey::Accessory3));
    assert!(!keys(&stack).contains(&LayerKey::Accessory2));
}

#[test]
fn mask_lifts_glasses_and_beard_shares_head_plane() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let resolver = TraitResolver::new(&d, &order);

    let masked = resolver
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Accessory 1", "Round Glasses"),
            ("Accessory 2", "Gas Mask"),
        ]))
        .unwrap();
    let k = keys(&masked);
    let glasses = k.iter().position(|k| *k == LayerKey::Accessory1OverMask).unwrap();
    let mask = k.iter().position(|k| *k == LayerKey::Accessory2).unwrap();
    assert!(glasses > mask);

    let plain = resolver
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Accessory 1", "Round Glasses"),
            ("Accessory 2", "Full Beard"),
        ]))
        .unwrap();
    let k = keys(&plain);
    assert!(k.contains(&LayerKey::Accessory1));
    let head = k.iter().position(|k| *k == LayerKey::Head).unwrap();
    let beard = k.iter().position(|k| *k == LayerKey::Beard).unwrap();
    assert_eq!(beard, head + 1);
}

#[test]
fn witch_hat_parts_interleave_with_body() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Hair/Hat", "Witch Hat"),
        ]))
        .unwrap();
    let k = keys(&stack);
    assert_eq!(k[0], LayerKey::WitchHatBack);
    let body = k.iter().position(|k| *k == LayerKey::Body).unwrap();
    let front1 = k.iter().position(|k| *k == LayerKey::WitchHatFront1).unwrap();
    let face = k.iter().position(|k| *k == LayerKey::Face).unwrap();
    assert!(body < front1 && front1 < face);
    assert!(k.contains(&LayerKey::WitchHatFront2));
    assert!(k.contains(&LayerKey::WitchHatFront3));
}

#[test]
fn full_helmet_moves_right_ear_behind_headwear() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("hair-hat", "Space Helmet"),
        ]))
        .unwrap();
    let k = keys(&stack);
    assert!(!k.contains(&LayerKey::EarRight));
    let ear = k
        .iter()
        .position(|k| *k == LayerKey::EarRightBehindHeadwear)
        .unwrap();
    let back = k.iter().position(|k| *k == LayerKey::HairHatBack).unwrap();
    assert!(ear < back);
    assert!(k.contains(&LayerKey::HairHatFront));
}

#[test]
fn suit_suppresses_top_and_bottom() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let resolver = TraitResolver::new(&d, &order);

    let dressed = resolver
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Top", "Red Hoodie"),
            ("Bottom", "Jeans"),
        ]))
        .unwrap();
    let k = keys(&dressed);
    assert!(k.contains(&LayerKey::SleeveLeft));
    assert!(k.contains(&LayerKey::Torso));
    assert!(k.contains(&LayerKey::SleeveRight));
    assert!(k.contains(&LayerKey::Bottom));

    let suited = resolver
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Suit", "Astronaut Suit"),
            ("Top", "Red Hoodie"),
            ("Bottom", "Jeans"),
        ]))
        .unwrap();
    let k = keys(&suited);
    assert!(k.contains(&LayerKey::Suit));
    assert!(!k.contains(&LayerKey::Torso));
    assert!(!k.contains(&LayerKey::Bottom));
}

#[test]
fn shoes_match_despite_spacing_and_gaps_are_skipped() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Shoes", "Red High Tops"),
            ("Bottom", "Corduroys"),
        ]))
        .unwrap();
    let k = keys(&stack);
    assert!(k.contains(&LayerKey::Shoes));
    assert!(!k.contains(&LayerKey::Bottom));
    assert_eq!(stack.len(), 8);
}

#[test]
fn repeated_categories_render_every_instance() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Accessory 2", "Scarf"),
            ("Accessory 2", "Gas Mask"),
        ]))
        .unwrap();
    let count = keys(&stack)
        .iter()
        .filter(|k| **k == LayerKey::Accessory2)
        .count();
    assert_eq!(count, 2);
}

#[test]
fn wave_targets_are_left_arm_sleeve_and_pen() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Top", "Red Hoodie"),
            ("Accessory 1", "Pen"),
        ]))
        .unwrap();
    let waving: Vec<_> = stack
        .layers()
        .iter()
        .filter(|l| l.is_wave_target())
        .map(|l| l.key)
        .collect();
    assert_eq!(
        waving,
        vec![LayerKey::Accessory1, LayerKey::ArmLeft, LayerKey::SleeveLeft]
    );
}

#[test]
fn order_overrides_change_paint_order() {
    let d = dicts();
    let order = LayerOrderTable::standard().with_override(LayerKey::Face, 1);
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[("Skin", "Light Skin - Light")]))
        .unwrap();
    assert_eq!(stack.layers()[0].key, LayerKey::Face);
}

#[test]
fn resorting_a_sorted_stack_is_a_no_op() {
    let d = dicts();
    let order = LayerOrderTable::standard();
    let stack = TraitResolver::new(&d, &order)
        .resolve(&meta(&[
            ("Skin", "Light Skin - Light"),
            ("Top", "Red Hoodie"),
            ("Hair/Hat", "Witch Hat"),
        ]))
        .unwrap();
    let again = LayerStack::from_layers(stack.layers().to_vec());
    assert_eq!(again, stack);
}
