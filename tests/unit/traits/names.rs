use super::*;

#[test]
fn category_spellings_are_case_insensitive() {
    assert!(TraitCategory::HairHat.matches_trait_type("Hair/Hat"));
    assert!(TraitCategory::HairHat.matches_trait_type("hair-hat"));
    assert!(TraitCategory::HairHat.matches_trait_type(" HAIR  HAT "));
    assert!(!TraitCategory::HairHat.matches_trait_type("hair"));
    assert!(TraitCategory::Skin.matches_trait_type("SKIN"));
    assert!(TraitCategory::Shoes.matches_trait_type("Shoe"));
    assert!(TraitCategory::Suit.matches_trait_type("Suits"));
}

#[test]
fn accessory_slots() {
    assert!(TraitCategory::Accessory(2).matches_trait_type("Accessory 2"));
    assert!(TraitCategory::Accessory(2).matches_trait_type("accessory-2"));
    assert!(TraitCategory::Accessory(3).matches_trait_type("Accessories_3"));
    assert!(TraitCategory::Accessory(1).matches_trait_type("accessory1"));
    assert!(!TraitCategory::Accessory(1).matches_trait_type("Accessory 2"));
    assert!(!TraitCategory::Accessory(1).matches_trait_type("Accessory 12"));
    assert_eq!(TraitCategory::Accessory(4).dictionary_name(), "accessory-4");
}

#[test]
fn skin_tone_parsing() {
    assert_eq!(parse_skin_tone("Light Skin - Light").as_deref(), Some("light"));
    assert_eq!(parse_skin_tone("Dark Skin - Deep Brown").as_deref(), Some("deep brown"));
    assert_eq!(parse_skin_tone("Olive skin").as_deref(), Some("olive"));
    assert_eq!(parse_skin_tone("   "), None);
    assert_eq!(parse_skin_tone("Skin - "), None);
}

#[test]
fn whitespace_and_dash_helpers() {
    assert_eq!(normalize_ws("  Red   High  Tops "), "Red High Tops");
    assert_eq!(fold("Red  HIGH"), "red high");
    assert_eq!(name_before_dash("Red Hoodie - Rare"), Some("Red Hoodie"));
    assert_eq!(name_before_dash("Red Hoodie"), None);
}

#[test]
fn special_item_heuristics() {
    assert!(is_witch_hat("Purple Witch Hat"));
    assert!(is_full_head_coverage("Gold Space Helmet"));
    assert!(is_full_head_coverage("Astronaut"));
    assert!(!is_full_head_coverage("Baseball Cap"));

    assert_eq!(bag_kind("Bag Backpack Red"), Some(BagKind::Backpack));
    assert_eq!(bag_kind("Leather Purse"), Some(BagKind::Single));
    assert_eq!(bag_kind("Neon Fanny Pack"), Some(BagKind::Single));
    assert_eq!(bag_kind("Baguette"), None);

    assert!(is_mask("Surgical Mask"));
    assert!(!is_mask("Masked Bandit Glasses"));
    assert!(is_beard("Long Beard"));
    assert!(is_pen("Gold Pen"));
    assert!(!is_pen("Pendant"));
}

#[test]
fn file_suffixes() {
    assert_eq!(file_suffix_index("hair-hat/witch/witch-hat-3.webp"), Some(3));
    assert_eq!(file_suffix_index("top/Red Hoodie-1.png"), Some(1));
    assert_eq!(file_suffix_index("top/red-hoodie.png"), None);
    assert_eq!(file_suffix_index("shoes/boots-7.png"), None);
    assert_eq!(file_stem("a/b/c-2.webp"), "c-2");
    assert_eq!(file_stem("plain"), "plain");
}
