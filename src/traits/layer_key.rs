use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of stacking identities a resolved layer can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKey {
    /// Back part of a backpack-like accessory, behind the whole figure.
    #[serde(rename = "accessory-3-back")]
    Accessory3Back,
    /// Back brim of a witch hat.
    WitchHatBack,
    /// Right ear pushed behind full-coverage headwear.
    EarRightBehindHeadwear,
    /// Back part of hair or hat.
    HairHatBack,
    /// Base body.
    Body,
    /// Bottom garment (shares the body plane).
    Bottom,
    /// Shoes (share the body plane).
    Shoes,
    /// Right arm.
    ArmRight,
    /// Full-body suit replacing top and bottom.
    Suit,
    /// Torso part of a top.
    Torso,
    /// Right sleeve of a top.
    SleeveRight,
    /// Middle part of a backpack-like accessory.
    #[serde(rename = "accessory-3-middle")]
    Accessory3Middle,
    /// Left ear.
    EarLeft,
    /// Head.
    Head,
    /// Beard (shares the head plane).
    Beard,
    /// First front part of a witch hat, between head and face.
    #[serde(rename = "witch-hat-front1")]
    WitchHatFront1,
    /// Face.
    Face,
    /// Right ear.
    EarRight,
    /// Accessory slot 1 (glasses).
    #[serde(rename = "accessory-1")]
    Accessory1,
    /// Accessory slot 2 (masks and similar).
    #[serde(rename = "accessory-2")]
    Accessory2,
    /// Accessory slot 1 lifted above a mask in slot 2.
    #[serde(rename = "accessory-1-over-mask")]
    Accessory1OverMask,
    /// Single-file accessory slot 3 (bags).
    #[serde(rename = "accessory-3")]
    Accessory3,
    /// Front part of hair or hat.
    HairHatFront,
    /// Second front part of a witch hat.
    #[serde(rename = "witch-hat-front2")]
    WitchHatFront2,
    /// Third front part of a witch hat.
    #[serde(rename = "witch-hat-front3")]
    WitchHatFront3,
    /// Left (waving) arm.
    ArmLeft,
    /// Left sleeve of a top, waves with the arm.
    SleeveLeft,
    /// Accessory slot 4 (hand-held items).
    #[serde(rename = "accessory-4")]
    Accessory4,
    /// Front part of a backpack-like accessory.
    #[serde(rename = "accessory-3-front")]
    Accessory3Front,
}

impl LayerKey {
    /// Every key, in standard back-to-front order.
    pub const ALL: [Self; 29] = [
        Self::Accessory3Back,
        Self::WitchHatBack,
        Self::EarRightBehindHeadwear,
        Self::HairHatBack,
        Self::Body,
        Self::Bottom,
        Self::Shoes,
        Self::ArmRight,
        Self::Suit,
        Self::Torso,
        Self::SleeveRight,
        Self::Accessory3Middle,
        Self::EarLeft,
        Self::Head,
        Self::Beard,
        Self::WitchHatFront1,
        Self::Face,
        Self::EarRight,
        Self::Accessory1,
        Self::Accessory2,
        Self::Accessory1OverMask,
        Self::Accessory3,
        Self::HairHatFront,
        Self::WitchHatFront2,
        Self::WitchHatFront3,
        Self::ArmLeft,
        Self::SleeveLeft,
        Self::Accessory4,
        Self::Accessory3Front,
    ];

    /// Stable kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accessory3Back => "accessory-3-back",
            Self::WitchHatBack => "witch-hat-back",
            Self::EarRightBehindHeadwear => "ear-right-behind-headwear",
            Self::HairHatBack => "hair-hat-back",
            Self::Body => "body",
            Self::Bottom => "bottom",
            Self::Shoes => "shoes",
            Self::ArmRight => "arm-right",
            Self::Suit => "suit",
            Self::Torso => "torso",
            Self::SleeveRight => "sleeve-right",
            Self::Accessory3Middle => "accessory-3-middle",
            Self::EarLeft => "ear-left",
            Self::Head => "head",
            Self::Beard => "beard",
            Self::WitchHatFront1 => "witch-hat-front1",
            Self::Face => "face",
            Self::EarRight => "ear-right",
            Self::Accessory1 => "accessory-1",
            Self::Accessory2 => "accessory-2",
            Self::Accessory1OverMask => "accessory-1-over-mask",
            Self::Accessory3 => "accessory-3",
            Self::HairHatFront => "hair-hat-front",
            Self::WitchHatFront2 => "witch-hat-front2",
            Self::WitchHatFront3 => "witch-hat-front3",
            Self::ArmLeft => "arm-left",
            Self::SleeveLeft => "sleeve-left",
            Self::Accessory4 => "accessory-4",
            Self::Accessory3Front => "accessory-3-front",
        }
    }

    /// Look a key up by its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Standard rank; lower paints first.
    ///
    /// `body`/`bottom`/`shoes` share a plane, as do `head`/`beard`: within a plane, append order
    /// decides.
    pub const fn standard_rank(self) -> i32 {
        match self {
            Self::Accessory3Back => 5,
            Self::WitchHatBack => 10,
            Self::EarRightBehindHeadwear => 18,
            Self::HairHatBack => 20,
            Self::Body | Self::Bottom | Self::Shoes => 30,
            Self::ArmRight => 32,
            Self::Suit => 34,
            Self::Torso => 35,
            Self::SleeveRight => 36,
            Self::Accessory3Middle => 38,
            Self::EarLeft => 40,
            Self::Head | Self::Beard => 45,
            Self::WitchHatFront1 => 47,
            Self::Face => 50,
            Self::EarRight => 52,
            Self::Accessory1 => 58,
            Self::Accessory2 => 60,
            Self::Accessory1OverMask => 62,
            Self::Accessory3 => 65,
            Self::HairHatFront => 70,
            Self::WitchHatFront2 => 72,
            Self::WitchHatFront3 => 74,
            Self::ArmLeft => 85,
            Self::SleeveLeft => 87,
            Self::Accessory4 => 88,
            Self::Accessory3Front => 90,
        }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from [`LayerKey`] to paint rank.
///
/// Starts from [`LayerKey::standard_rank`]; individual ranks can be overridden from configuration
/// when product intent differs from the standard table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerOrderTable {
    overrides: HashMap<LayerKey, i32>,
}

impl LayerOrderTable {
    /// The standard table with no overrides.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Return a table with `key` moved to `rank`.
    pub fn with_override(mut self, key: LayerKey, rank: i32) -> Self {
        self.overrides.insert(key, rank);
        self
    }

    /// Rank for `key`.
    pub fn rank(&self, key: LayerKey) -> i32 {
        self.overrides
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.standard_rank())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/traits/layer_key.rs"]
mod tests;
