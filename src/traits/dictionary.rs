use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;

use crate::foundation::error::AnimResult;
use crate::traits::layer_key::LayerKey;
use crate::traits::names::{TraitCategory, file_stem, fold, name_before_dash, normalize_ws};

/// Where trait dictionaries come from.
///
/// `fetch` returns `Ok(None)` when the named dictionary does not exist; errors are reserved for
/// unreadable sources.
pub trait DictionarySource {
    /// Fetch the JSON document for dictionary `name` (e.g. `"skin"`, `"accessory-2"`).
    fn fetch(&self, name: &str) -> AnimResult<Option<serde_json::Value>>;
}

/// Reads `<root>/<name>.json`.
#[derive(Clone, Debug)]
pub struct DirDictionarySource {
    root: PathBuf,
}

impl DirDictionarySource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DictionarySource for DirDictionarySource {
    fn fetch(&self, name: &str) -> AnimResult<Option<serde_json::Value>> {
        let path = self.root.join(format!("{name}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read trait dictionary '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// In-memory dictionaries, keyed by dictionary name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDictionarySource {
    docs: HashMap<String, serde_json::Value>,
}

impl InMemoryDictionarySource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace dictionary `name`.
    pub fn with(mut self, name: impl Into<String>, doc: serde_json::Value) -> Self {
        self.docs.insert(name.into(), doc);
        self
    }
}

impl DictionarySource for InMemoryDictionarySource {
    fn fetch(&self, name: &str) -> AnimResult<Option<serde_json::Value>> {
        Ok(self.docs.get(name).cloned())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileList {
    One(String),
    Many(Vec<String>),
}

impl FileList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// Name -> asset files for one optional category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraitDictionary {
    entries: BTreeMap<String, Vec<String>>,
}

impl TraitDictionary {
    /// Parse `{ "<value name>": "file" | ["file-1", "file-2"] }`.
    pub fn from_json(doc: serde_json::Value) -> AnimResult<Self> {
        let raw: BTreeMap<String, FileList> = serde_json::from_value(doc)?;
        Ok(Self {
            entries: raw.into_iter().map(|(k, v)| (k, v.into_vec())).collect(),
        })
    }

    /// Build from `(name, files)` pairs.
    pub fn from_entries<I, K, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<F>)>,
        K: Into<String>,
        F: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, files)| (k.into(), files.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the files for a trait value.
    ///
    /// Tries an exact match first, then the part of the value before `" - "`. With
    /// `normalize_whitespace`, both sides are compared after collapsing whitespace runs.
    pub fn lookup(&self, value: &str, normalize_whitespace: bool) -> Option<&[String]> {
        let mut candidates = vec![value];
        if let Some(head) = name_before_dash(value) {
            candidates.push(head);
        }

        for candidate in candidates {
            if let Some(files) = self.entries.get(candidate) {
                return Some(files.as_slice());
            }
            if normalize_whitespace {
                let wanted = normalize_ws(candidate);
                if let Some((_, files)) = self
                    .entries
                    .iter()
                    .find(|(k, _)| normalize_ws(k) == wanted)
                {
                    return Some(files.as_slice());
                }
            }
        }
        None
    }
}

/// Body part files for one skin tone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseParts {
    parts: Vec<(LayerKey, String)>,
}

const BASE_KEYS: [LayerKey; 7] = [
    LayerKey::Body,
    LayerKey::ArmRight,
    LayerKey::ArmLeft,
    LayerKey::EarLeft,
    LayerKey::Head,
    LayerKey::Face,
    LayerKey::EarRight,
];

impl BaseParts {
    /// Parts in canonical append order (body first, right ear last).
    pub fn parts(&self) -> &[(LayerKey, String)] {
        &self.parts
    }

    /// File for `key`, if present.
    pub fn get(&self, key: LayerKey) -> Option<&str> {
        self.parts
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, p)| p.as_str())
    }

    fn from_named(mut named: HashMap<LayerKey, String>) -> Self {
        let parts = BASE_KEYS
            .iter()
            .filter_map(|k| named.remove(k).map(|p| (*k, p)))
            .collect();
        Self { parts }
    }

    fn from_files(files: Vec<String>) -> Self {
        let mut named = HashMap::new();
        for file in files {
            let stem = fold(file_stem(&file));
            // Longest names first so "ear-right" never matches a plain "ear" rule.
            let key = BASE_KEYS
                .iter()
                .copied()
                .filter(|k| stem.contains(k.as_str()))
                .max_by_key(|k| k.as_str().len());
            match key {
                Some(k) => {
                    named.entry(k).or_insert(file);
                }
                None => tracing::debug!(file = %file, "skin file does not name a body part"),
            }
        }
        Self::from_named(named)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BasePartsRepr {
    Named(BTreeMap<String, String>),
    Files(Vec<String>),
}

/// Skin tone -> base body parts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkinDictionary {
    tones: BTreeMap<String, BaseParts>,
}

impl SkinDictionary {
    /// Parse `{ "<tone>": { "body": "...", "arm-left": "..." } | ["...body.png", ...] }`.
    ///
    /// Tone keys are folded to lower case; unknown part names are ignored with a log line.
    pub fn from_json(doc: serde_json::Value) -> AnimResult<Self> {
        let raw: BTreeMap<String, BasePartsRepr> = serde_json::from_value(doc)?;
        let mut tones = BTreeMap::new();
        for (tone, repr) in raw {
            let parts = match repr {
                BasePartsRepr::Named(map) => {
                    let mut named = HashMap::new();
                    for (part, file) in map {
                        match LayerKey::from_name(&fold(&part)) {
                            Some(k) if BASE_KEYS.contains(&k) => {
                                named.insert(k, file);
                            }
                            _ => tracing::warn!(tone = %tone, part = %part, "unknown base part"),
                        }
                    }
                    BaseParts::from_named(named)
                }
                BasePartsRepr::Files(files) => BaseParts::from_files(files),
            };
            tones.insert(fold(&tone), parts);
        }
        Ok(Self { tones })
    }

    /// Base parts for an already folded tone.
    pub fn lookup(&self, tone: &str) -> Option<&BaseParts> {
        self.tones.get(&fold(tone)).filter(|p| !p.parts.is_empty())
    }
}

/// Every dictionary the resolver consults, fetched once per source.
#[derive(Clone, Debug, Default)]
pub struct TraitDictionaries {
    /// Skin tone dictionary.
    pub skin: SkinDictionary,
    categories: HashMap<TraitCategory, TraitDictionary>,
}

impl TraitDictionaries {
    /// Fetch and parse all dictionaries.
    ///
    /// A missing or malformed dictionary is logged and treated as empty; only the skin
    /// dictionary is essential and its absence surfaces later as a missing base trait.
    pub fn load(source: &dyn DictionarySource) -> Self {
        let skin = match fetch_parsed(source, TraitCategory::Skin, SkinDictionary::from_json) {
            Some(skin) => skin,
            None => SkinDictionary::default(),
        };

        let mut categories = HashMap::new();
        for category in TraitCategory::OPTIONAL {
            if let Some(dict) = fetch_parsed(source, category, TraitDictionary::from_json) {
                categories.insert(category, dict);
            }
        }

        Self { skin, categories }
    }

    /// Replace one category dictionary.
    pub fn with_category(mut self, category: TraitCategory, dict: TraitDictionary) -> Self {
        self.categories.insert(category, dict);
        self
    }

    /// Dictionary for `category`, if loaded.
    pub fn category(&self, category: TraitCategory) -> Option<&TraitDictionary> {
        self.categories.get(&category)
    }
}

fn fetch_parsed<T>(
    source: &dyn DictionarySource,
    category: TraitCategory,
    parse: impl FnOnce(serde_json::Value) -> AnimResult<T>,
) -> Option<T> {
    let name = category.dictionary_name();
    match source.fetch(&name) {
        Ok(Some(doc)) => match parse(doc) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(dictionary = %name, error = %e, "malformed trait dictionary");
                None
            }
        },
        Ok(None) => {
            tracing::debug!(dictionary = %name, "trait dictionary not found");
            None
        }
        Err(e) => {
            tracing::warn!(dictionary = %name, error = %e, "failed to fetch trait dictionary");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/traits/dictionary.rs"]
mod tests;
