//! Normalization of upstream trait naming.
//!
//! Upstream metadata spells categories and values inconsistently (`Hair/Hat` vs `hair-hat`,
//! doubled spaces in shoe names, bags filed under accessory 2). These helpers keep every
//! heuristic in one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trait categories the resolver understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TraitCategory {
    /// Skin tone; selects the base body parts.
    Skin,
    /// Hair or hat.
    HairHat,
    /// Top garment.
    Top,
    /// Bottom garment.
    Bottom,
    /// Shoes.
    Shoes,
    /// Full-body suit.
    Suit,
    /// Accessory slot 1..=4.
    Accessory(u8),
}

impl TraitCategory {
    /// Every optional category, in resolution order.
    pub const OPTIONAL: [Self; 9] = [
        Self::Suit,
        Self::Top,
        Self::Bottom,
        Self::Shoes,
        Self::HairHat,
        Self::Accessory(1),
        Self::Accessory(2),
        Self::Accessory(3),
        Self::Accessory(4),
    ];

    /// Name of the dictionary resource holding this category's files.
    pub fn dictionary_name(self) -> String {
        match self {
            Self::Skin => "skin".to_owned(),
            Self::HairHat => "hair-hat".to_owned(),
            Self::Top => "top".to_owned(),
            Self::Bottom => "bottom".to_owned(),
            Self::Shoes => "shoes".to_owned(),
            Self::Suit => "suit".to_owned(),
            Self::Accessory(n) => format!("accessory-{n}"),
        }
    }

    /// Case-insensitive match against the accepted spellings of this category.
    pub fn matches_trait_type(self, trait_type: &str) -> bool {
        let folded = fold(trait_type);
        match self {
            Self::Skin => folded == "skin",
            Self::HairHat => matches!(
                folded.as_str(),
                "hair/hat" | "hair-hat" | "hair hat" | "hair_hat" | "hairhat" | "hat/hair"
            ),
            Self::Top => matches!(folded.as_str(), "top" | "tops"),
            Self::Bottom => matches!(folded.as_str(), "bottom" | "bottoms"),
            Self::Shoes => matches!(folded.as_str(), "shoes" | "shoe" | "footwear"),
            Self::Suit => matches!(folded.as_str(), "suit" | "suits"),
            Self::Accessory(n) => accessory_slot(&folded) == Some(n),
        }
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dictionary_name())
    }
}

fn accessory_slot(folded: &str) -> Option<u8> {
    let rest = folded
        .strip_prefix("accessories")
        .or_else(|| folded.strip_prefix("accessory"))?;
    let rest = rest.trim_start_matches([' ', '-', '_']);
    match rest {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case, whitespace-normalized form used for case-insensitive comparisons.
pub fn fold(s: &str) -> String {
    normalize_ws(s).to_lowercase()
}

/// The part of a value before `" - "`, if the separator is present.
pub fn name_before_dash(s: &str) -> Option<&str> {
    s.split_once(" - ").map(|(head, _)| head.trim_end())
}

/// Extract the skin tone from `"<Adjective> Skin - <Tone>"`.
///
/// Falls back to the first word when there is no `" - "` separator. Tones are lower-cased.
pub fn parse_skin_tone(value: &str) -> Option<String> {
    let tone = match value.split_once(" - ") {
        Some((_, tone)) => tone.trim(),
        None => value.split_whitespace().next().unwrap_or(""),
    };
    if tone.is_empty() {
        None
    } else {
        Some(fold(tone))
    }
}

fn tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_token(name: &str, wanted: &[&str]) -> bool {
    tokens(name).iter().any(|t| wanted.contains(&t.as_str()))
}

/// Witch hats decompose into four interleaved parts.
pub fn is_witch_hat(name: &str) -> bool {
    fold(name).contains("witch")
}

const FULL_HEAD_MARKERS: [&str; 5] = [
    "full helmet",
    "space helmet",
    "astronaut",
    "diving helmet",
    "knight helmet",
];

/// Headwear that covers the whole head (the right ear must go behind it).
pub fn is_full_head_coverage(name: &str) -> bool {
    let folded = fold(name);
    FULL_HEAD_MARKERS.iter().any(|m| folded.contains(m))
}

/// Kind of bag carried in an accessory slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BagKind {
    /// Backpacks: back / middle / front parts.
    Backpack,
    /// Bags, purses and fanny packs: a single part.
    Single,
}

/// Classify a bag-like accessory by naming convention.
pub fn bag_kind(name: &str) -> Option<BagKind> {
    let folded = fold(name);
    if has_token(name, &["backpack"]) || folded.contains("back pack") {
        return Some(BagKind::Backpack);
    }
    if has_token(name, &["bag", "purse", "fannypack", "handbag", "tote"])
        || folded.contains("fanny pack")
        || folded.contains("fanny-pack")
    {
        return Some(BagKind::Single);
    }
    None
}

/// Masks in accessory slot 2 lift glasses above them.
pub fn is_mask(name: &str) -> bool {
    has_token(name, &["mask"])
}

/// Beards render on the head plane.
pub fn is_beard(name: &str) -> bool {
    has_token(name, &["beard"])
}

/// Pens are held in the waving hand.
pub fn is_pen(name: &str) -> bool {
    has_token(name, &["pen"])
}

/// Numeric back-to-front suffix of an asset file (`hat-2.webp` -> `2`).
pub fn file_suffix_index(path: &str) -> Option<u8> {
    let stem = file_stem(path);
    let (_, digits) = stem.rsplit_once('-')?;
    match digits.trim() {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// File name without directories and extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/traits/names.rs"]
mod tests;
