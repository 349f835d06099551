// ✨ Card View State - which sprite each rendered card currently shows
//
// Looked up by creature id instead of living inside a UI callback.
// A fresh render replaces the whole map, so every card starts at Primary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    #[default]
    Primary,
    Alternate,
}

impl ImageVariant {
    pub fn toggled(self) -> Self {
        match self {
            ImageVariant::Primary => ImageVariant::Alternate,
            ImageVariant::Alternate => ImageVariant::Primary,
        }
    }

    /// Badge text shown next to the sprite
    pub fn label(self) -> &'static str {
        match self {
            ImageVariant::Primary => "Normal",
            ImageVariant::Alternate => "✨ Shiny",
        }
    }

    /// Style classes for the badge
    pub fn label_classes(self) -> &'static [&'static str] {
        match self {
            ImageVariant::Primary => &["bg-gray-200", "text-gray-600"],
            ImageVariant::Alternate => &["bg-yellow-200", "text-yellow-800", "animate-sparkle"],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewStates {
    cards: HashMap<u32, ImageVariant>,
}

impl ViewStates {
    /// Fresh state for a new render: every listed card at Primary.
    pub fn reset<I: IntoIterator<Item = u32>>(ids: I) -> Self {
        Self {
            cards: ids.into_iter().map(|id| (id, ImageVariant::Primary)).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<ImageVariant> {
        self.cards.get(&id).copied()
    }

    /// Flip the card's variant. `None` if the card is not currently rendered.
    pub fn toggle(&mut self, id: u32) -> Option<ImageVariant> {
        let variant = self.cards.get_mut(&id)?;
        *variant = variant.toggled();
        Some(*variant)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_toggle_returns_to_primary() {
        let mut states = ViewStates::reset([1, 2, 3]);
        assert_eq!(states.get(2), Some(ImageVariant::Primary));

        assert_eq!(states.toggle(2), Some(ImageVariant::Alternate));
        assert_eq!(ImageVariant::Alternate.label(), "✨ Shiny");

        let back = states.toggle(2).unwrap();
        assert_eq!(back, ImageVariant::Primary);
        assert_eq!(back.label(), "Normal");
        assert_eq!(back.label_classes(), &["bg-gray-200", "text-gray-600"]);

        assert_eq!(states.get(1), Some(ImageVariant::Primary));
    }

    #[test]
    fn test_toggle_unknown_card() {
        let mut states = ViewStates::reset([1]);
        assert_eq!(states.toggle(99), None);
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_reset_clears_previous_toggles() {
        let mut states = ViewStates::reset([7]);
        states.toggle(7);
        let states = ViewStates::reset([7]);
        assert_eq!(states.get(7), Some(ImageVariant::Primary));
    }
}
