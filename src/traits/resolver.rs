use serde::Serialize;

use crate::foundation::error::{AnimError, AnimResult};
use crate::traits::dictionary::TraitDictionaries;
use crate::traits::layer_key::{LayerKey, LayerOrderTable};
use crate::traits::metadata::TokenMetadata;
use crate::traits::names::{
    BagKind, TraitCategory, bag_kind, file_stem, file_suffix_index, fold, is_beard,
    is_full_head_coverage, is_mask, is_pen, is_witch_hat, parse_skin_tone,
};

/// One image placed at a paint rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedLayer {
    /// Asset path, relative to the assets root.
    pub image_source: String,
    /// Paint rank; lower paints first.
    pub rank: i32,
    /// Stacking identity the rank came from.
    pub key: LayerKey,
    /// Diagnostic label, `"<category>:<key>:<value>"`.
    pub tag: String,
}

impl ResolvedLayer {
    /// Whether the arm-wave rotation applies to this layer.
    ///
    /// Matches the left arm, the left sleeve and any pen held in an accessory slot.
    pub fn is_wave_target(&self) -> bool {
        let mut parts = self.tag.splitn(3, ':');
        let category = parts.next().unwrap_or_default();
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();

        matches!(key, "arm-left" | "sleeve-left")
            || (category.starts_with("accessory") && is_pen(value))
    }
}

/// Resolved layers in paint order.
///
/// Built once per token and never mutated; swapping stacks is done by replacing the whole value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LayerStack {
    layers: Vec<ResolvedLayer>,
}

impl LayerStack {
    /// Stable-sort `layers` by rank. Layers sharing a rank keep their append order.
    pub fn from_layers(mut layers: Vec<ResolvedLayer>) -> Self {
        layers.sort_by_key(|l| l.rank);
        Self { layers }
    }

    /// Layers in paint order.
    pub fn layers(&self) -> &[ResolvedLayer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// `true` when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// `true` when ranks are non-decreasing.
    pub fn is_sorted(&self) -> bool {
        self.layers.windows(2).all(|w| w[0].rank <= w[1].rank)
    }
}

/// Maps token metadata to a [`LayerStack`].
#[derive(Clone, Copy, Debug)]
pub struct TraitResolver<'a> {
    dicts: &'a TraitDictionaries,
    order: &'a LayerOrderTable,
}

struct StackBuilder<'a> {
    order: &'a LayerOrderTable,
    layers: Vec<ResolvedLayer>,
}

impl StackBuilder<'_> {
    fn push(&mut self, category: TraitCategory, key: LayerKey, value: &str, file: &str) {
        self.layers.push(ResolvedLayer {
            image_source: file.to_owned(),
            rank: self.order.rank(key),
            key,
            tag: format!("{category}:{key}:{value}"),
        });
    }
}

impl<'a> TraitResolver<'a> {
    /// Resolver over loaded dictionaries and an order table.
    pub fn new(dicts: &'a TraitDictionaries, order: &'a LayerOrderTable) -> Self {
        Self { dicts, order }
    }

    /// Resolve `metadata` into paint order.
    ///
    /// Fails only when no base body can be found. Every other lookup miss drops that layer and
    /// is logged.
    #[tracing::instrument(
        skip_all,
        fields(token = metadata.token_id.as_deref().unwrap_or("-"), attributes = metadata.attributes.len())
    )]
    pub fn resolve(&self, metadata: &TokenMetadata) -> AnimResult<LayerStack> {
        let skin_value = values_for(metadata, TraitCategory::Skin)
            .into_iter()
            .next()
            .ok_or_else(|| AnimError::missing_base_trait("token has no Skin attribute"))?;
        let tone = parse_skin_tone(&skin_value).ok_or_else(|| {
            AnimError::missing_base_trait(format!("cannot parse skin tone from '{skin_value}'"))
        })?;
        let base = self.dicts.skin.lookup(&tone).ok_or_else(|| {
            AnimError::missing_base_trait(format!("no base parts for skin tone '{tone}'"))
        })?;

        let headwear = values_for(metadata, TraitCategory::HairHat);
        let full_cover = headwear.iter().any(|v| is_full_head_coverage(v));

        let mut out = StackBuilder {
            order: self.order,
            layers: Vec::new(),
        };

        for (key, file) in base.parts() {
            let key = if *key == LayerKey::EarRight && full_cover {
                LayerKey::EarRightBehindHeadwear
            } else {
                *key
            };
            out.push(TraitCategory::Skin, key, &tone, file);
        }

        let before_suit = out.layers.len();
        self.each_file(metadata, TraitCategory::Suit, false, |value, file| {
            out.push(TraitCategory::Suit, LayerKey::Suit, value, file);
        });
        let has_suit = out.layers.len() > before_suit;

        if has_suit {
            tracing::debug!("suit present, skipping top and bottom");
        } else {
            self.each_file(metadata, TraitCategory::Top, false, |value, file| {
                out.push(TraitCategory::Top, top_key(file), value, file);
            });
            self.each_file(metadata, TraitCategory::Bottom, false, |value, file| {
                out.push(TraitCategory::Bottom, LayerKey::Bottom, value, file);
            });
        }

        self.each_file(metadata, TraitCategory::Shoes, true, |value, file| {
            out.push(TraitCategory::Shoes, LayerKey::Shoes, value, file);
        });

        self.each_file(metadata, TraitCategory::HairHat, false, |value, file| {
            out.push(TraitCategory::HairHat, headwear_key(value, file), value, file);
        });

        self.resolve_accessories(metadata, &mut out);

        let stack = LayerStack::from_layers(out.layers);
        tracing::debug!(layers = stack.len(), tone = %tone, "resolved layer stack");
        Ok(stack)
    }

    fn resolve_accessories(&self, metadata: &TokenMetadata, out: &mut StackBuilder<'_>) {
        let slot2 = values_for(metadata, TraitCategory::Accessory(2));
        let mask_present = slot2.iter().any(|v| is_mask(v));

        let acc1 = TraitCategory::Accessory(1);
        self.each_file(metadata, acc1, false, |value, file| {
            let key = if is_beard(value) {
                LayerKey::Beard
            } else if mask_present {
                LayerKey::Accessory1OverMask
            } else {
                LayerKey::Accessory1
            };
            out.push(acc1, key, value, file);
        });

        let acc2 = TraitCategory::Accessory(2);
        let acc3 = TraitCategory::Accessory(3);
        for value in &slot2 {
            match bag_kind(value) {
                Some(kind) => {
                    tracing::debug!(value = %value, "bag in accessory 2, drawing as accessory 3");
                    let files = self
                        .lookup(acc2, value, false)
                        .or_else(|| self.lookup(acc3, value, false));
                    match files {
                        Some(files) => {
                            for file in files {
                                out.push(acc3, bag_key(kind, file), value, file);
                            }
                        }
                        None => log_gap(acc2, value),
                    }
                }
                None => match self.lookup(acc2, value, false) {
                    Some(files) => {
                        let key = if is_beard(value) {
                            LayerKey::Beard
                        } else {
                            LayerKey::Accessory2
                        };
                        for file in files {
                            out.push(acc2, key, value, file);
                        }
                    }
                    None => log_gap(acc2, value),
                },
            }
        }

        self.each_file(metadata, acc3, false, |value, file| {
            let key = if is_beard(value) {
                LayerKey::Beard
            } else {
                bag_key(bag_kind(value).unwrap_or(BagKind::Single), file)
            };
            out.push(acc3, key, value, file);
        });

        let acc4 = TraitCategory::Accessory(4);
        self.each_file(metadata, acc4, false, |value, file| {
            let key = if is_beard(value) {
                LayerKey::Beard
            } else {
                LayerKey::Accessory4
            };
            out.push(acc4, key, value, file);
        });
    }

    fn lookup(&self, category: TraitCategory, value: &str, normalize: bool) -> Option<&'a [String]> {
        self.dicts
            .category(category)
            .and_then(|d| d.lookup(value, normalize))
    }

    /// Call `f` for every file of every instance of `category`, logging gaps.
    fn each_file(
        &self,
        metadata: &TokenMetadata,
        category: TraitCategory,
        normalize: bool,
        mut f: impl FnMut(&str, &str),
    ) {
        for value in values_for(metadata, category) {
            match self.lookup(category, &value, normalize) {
                Some(files) => {
                    for file in files {
                        f(&value, file);
                    }
                }
                None => log_gap(category, &value),
            }
        }
    }
}

fn log_gap(category: TraitCategory, value: &str) {
    tracing::warn!(category = %category, value = %value, "no asset files for trait value");
}

/// Every non-blank value of `category`, in attribute order.
fn values_for(metadata: &TokenMetadata, category: TraitCategory) -> Vec<String> {
    metadata
        .attributes
        .iter()
        .filter(|a| category.matches_trait_type(&a.trait_type))
        .map(|a| a.value.as_text())
        .filter(|v| !v.trim().is_empty())
        .collect()
}

fn top_key(file: &str) -> LayerKey {
    let stem = fold(file_stem(file));
    for key in [LayerKey::SleeveLeft, LayerKey::SleeveRight, LayerKey::Torso] {
        if stem.contains(key.as_str()) {
            return key;
        }
    }
    match file_suffix_index(file) {
        Some(1) => LayerKey::SleeveLeft,
        Some(3) => LayerKey::SleeveRight,
        _ => LayerKey::Torso,
    }
}

fn headwear_key(value: &str, file: &str) -> LayerKey {
    let suffix = file_suffix_index(file);
    if is_witch_hat(value) {
        return match suffix {
            Some(1) => LayerKey::WitchHatBack,
            Some(3) => LayerKey::WitchHatFront2,
            Some(4) => LayerKey::WitchHatFront3,
            _ => LayerKey::WitchHatFront1,
        };
    }
    match suffix {
        Some(1) => LayerKey::HairHatBack,
        _ => LayerKey::HairHatFront,
    }
}

fn bag_key(kind: BagKind, file: &str) -> LayerKey {
    match (kind, file_suffix_index(file)) {
        (BagKind::Backpack, Some(1)) => LayerKey::Accessory3Back,
        (BagKind::Backpack, Some(2)) => LayerKey::Accessory3Middle,
        (BagKind::Backpack, Some(3)) => LayerKey::Accessory3Front,
        _ => LayerKey::Accessory3,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/traits/resolver.rs"]
mod tests;
