use super::*;
use serde_json::json;

#[test]
fn lookup_exact_then_before_dash() {
    let d = TraitDictionary::from_json(json!({
        "Red Hoodie": ["top/red-hoodie-1.png", "top/red-hoodie-2.png"],
        "Cap": "hair-hat/cap.png"
    }))
    .unwrap();
    assert_eq!(d.len(), 2);
    assert_eq!(d.lookup("Red Hoodie", false).unwrap().len(), 2);
    assert_eq!(
        d.lookup("Red Hoodie - Legendary", false).unwrap()[0],
        "top/red-hoodie-1.png"
    );
    assert_eq!(d.lookup("Cap", false).unwrap(), ["hair-hat/cap.png"]);
    assert!(d.lookup("Blue Hoodie", false).is_none());
}

#[test]
fn lookup_with_whitespace_normalization() {
    let d = TraitDictionary::from_entries([("Red  High Tops", vec!["shoes/red.png"])]);
    assert!(d.lookup("Red High Tops", false).is_none());
    assert_eq!(d.lookup("Red High  Tops", true).unwrap(), ["shoes/red.png"]);
}

#[test]
fn skin_dictionary_named_and_file_forms() {
    let skin = SkinDictionary::from_json(json!({
        "Light": {
            "body": "skin/light/body.png",
            "arm-left": "skin/light/arm-left.png",
            "head": "skin/light/head.png",
            "tail": "skin/light/tail.png"
        },
        "dark": [
            "skin/dark/ear-right.png",
            "skin/dark/body.png",
            "skin/dark/face.png"
        ]
    }))
    .unwrap();

    let light = skin.lookup("light").unwrap();
    let keys: Vec<_> = light.parts().iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![LayerKey::Body, LayerKey::ArmLeft, LayerKey::Head]);

    let dark = skin.lookup("DARK").unwrap();
    assert_eq!(dark.get(LayerKey::EarRight), Some("skin/dark/ear-right.png"));
    assert_eq!(dark.parts()[0].0, LayerKey::Body);
    assert!(skin.lookup("olive").is_none());
}

#[test]
fn load_tolerates_missing_and_malformed_dictionaries() {
    let source = InMemoryDictionarySource::new()
        .with("skin", json!({ "light": { "body": "b.png" } }))
        .with("top", json!(42))
        .with("shoes", json!({ "Boots": "shoes/boots.png" }));
    let dicts = TraitDictionaries::load(&source);
    assert!(dicts.skin.lookup("light").is_some());
    assert!(dicts.category(TraitCategory::Top).is_none());
    assert!(dicts.category(TraitCategory::Bottom).is_none());
    assert_eq!(dicts.category(TraitCategory::Shoes).unwrap().len(), 1);
}

#[test]
fn dir_source_reads_json_files() {
    let dir = std::env::temp_dir().join(format!("nft_anim_dict_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("bottom.json"), r#"{ "Jeans": "bottom/jeans.png" }"#).unwrap();

    let source = DirDictionarySource::new(&dir);
    assert!(source.fetch("bottom").unwrap().is_some());
    assert!(source.fetch("missing").unwrap().is_none());

    std::fs::remove_dir_all(&dir).ok();
}
