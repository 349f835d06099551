// 🔎 Gallery Filter - free-text name search AND category selector
//
// Pure function over the full collection. Called on every keystroke and
// every selector change, so it never touches the network or the session.

use crate::creature::{Collection, Creature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category vocabulary offered by the selector, in menu order.
pub const CATEGORY_VOCABULARY: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Selector value meaning "match every category".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelector {
    #[default]
    All,
    Category(String),
}

impl CategorySelector {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            CategorySelector::All
        } else {
            CategorySelector::Category(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategorySelector::All => ALL_CATEGORIES,
            CategorySelector::Category(name) => name,
        }
    }

    pub fn matches(&self, creature: &Creature) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Category(name) => creature.has_category(name),
        }
    }

    /// Next entry in the selector menu (`all` followed by the vocabulary), wrapping.
    pub fn next(&self) -> Self {
        match self.menu_position() {
            None => CategorySelector::Category(CATEGORY_VOCABULARY[0].to_string()),
            Some(i) if i + 1 < CATEGORY_VOCABULARY.len() => {
                CategorySelector::Category(CATEGORY_VOCABULARY[i + 1].to_string())
            }
            Some(_) => CategorySelector::All,
        }
    }

    pub fn previous(&self) -> Self {
        match self.menu_position() {
            None => CategorySelector::Category(
                CATEGORY_VOCABULARY[CATEGORY_VOCABULARY.len() - 1].to_string(),
            ),
            Some(0) => CategorySelector::All,
            Some(i) => CategorySelector::Category(CATEGORY_VOCABULARY[i - 1].to_string()),
        }
    }

    // Unknown categories behave like the first vocabulary slot when cycling.
    fn menu_position(&self) -> Option<usize> {
        match self {
            CategorySelector::All => None,
            CategorySelector::Category(name) => Some(
                CATEGORY_VOCABULARY
                    .iter()
                    .position(|c| c == name)
                    .unwrap_or(0),
            ),
        }
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CategorySelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategorySelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CategorySelector::parse(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: CategorySelector,
}

impl FilterQuery {
    pub fn new(text: impl Into<String>, category: &str) -> Self {
        Self {
            text: text.into(),
            category: CategorySelector::parse(category),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.text.is_empty() && self.category == CategorySelector::All
    }

    pub fn matches(&self, creature: &Creature) -> bool {
        let needle = self.text.to_lowercase();
        matches_name(creature, &needle) && self.category.matches(creature)
    }
}

fn matches_name(creature: &Creature, needle_lower: &str) -> bool {
    needle_lower.is_empty() || creature.name.to_lowercase().contains(needle_lower)
}

/// Ordered subsequence of `collection` whose entries match both predicates.
pub fn apply(collection: &Collection, query: &FilterQuery) -> Collection {
    let needle = query.text.to_lowercase();

    collection
        .iter()
        .filter(|c| matches_name(c, &needle) && query.category.matches(c))
        .cloned()
        .collect()
}
