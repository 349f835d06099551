// 🐾 Creature Entity - one catalog record as fetched from the remote service
//
// A Creature is an immutable snapshot: fetched once, never mutated.
// The Collection keeps fetch batches ordered by identifier.

use serde::{Deserialize, Serialize};

// ============================================================================
// CREATURE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Catalog identifier (1-based, unique)
    pub id: u32,

    /// Display name as the catalog spells it (lowercase, e.g. "bulbasaur")
    pub name: String,

    /// Category tags in slot order (e.g. ["grass", "poison"])
    pub categories: Vec<String>,

    /// Default sprite locator
    pub primary_image: Option<String>,

    /// Alternate (shiny) sprite locator
    pub alternate_image: Option<String>,

    /// Height in decimetres
    pub height: u32,

    /// Weight in hectograms
    pub weight: u32,
}

impl Creature {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

// ============================================================================
// WIRE FORMAT (catalog JSON)
// ============================================================================

/// Subset of the catalog's `/pokemon/{id}` payload that the gallery reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreature {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub types: Vec<ApiTypeSlot>,
    #[serde(default)]
    pub sprites: ApiSprites,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTypeSlot {
    #[serde(default)]
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiNamedResource {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

impl From<ApiCreature> for Creature {
    fn from(api: ApiCreature) -> Self {
        let mut slots = api.types;
        slots.sort_by_key(|s| s.slot);

        Self {
            id: api.id,
            name: api.name,
            categories: slots.into_iter().map(|s| s.kind.name).collect(),
            primary_image: api.sprites.front_default,
            alternate_image: api.sprites.front_shiny,
            height: api.height,
            weight: api.weight,
        }
    }
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Ordered creatures, ascending by identifier with no duplicate ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    creatures: Vec<Creature>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a fetch batch in any completion order.
    pub fn from_batch(mut creatures: Vec<Creature>) -> Self {
        creatures.sort_by_key(|c| c.id);
        creatures.dedup_by_key(|c| c.id);
        Self { creatures }
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Creature> {
        self.creatures.iter()
    }

    pub fn as_slice(&self) -> &[Creature] {
        &self.creatures
    }

    pub fn get(&self, id: u32) -> Option<&Creature> {
        self.creatures
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.creatures[i])
    }

    pub fn ids(&self) -> Vec<u32> {
        self.creatures.iter().map(|c| c.id).collect()
    }
}

// Filter output is already an ordered subsequence, so no re-sort needed.
impl FromIterator<Creature> for Collection {
    fn from_iter<I: IntoIterator<Item = Creature>>(iter: I) -> Self {
        Self {
            creatures: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Creature;
    type IntoIter = std::slice::Iter<'a, Creature>;

    fn into_iter(self) -> Self::IntoIter {
        self.creatures.iter()
    }
}

#[cfg(test)]
pub(crate) fn test_creature(id: u32, name: &str, categories: &[&str]) -> Creature {
    Creature {
        id,
        name: name.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        primary_image: Some(format!("https://img.example/{}.png", id)),
        alternate_image: Some(format!("https://img.example/shiny/{}.png", id)),
        height: 7,
        weight: 69,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_catalog_payload() {
        let payload = serde_json::json!({
            "id": 1,
            "name": "bulbasaur",
            "height": 7,
            "weight": 69,
            "base_experience": 64,
            "types": [
                {"slot": 2, "type": {"name": "poison", "url": "https://pokeapi.co/api/v2/type/4/"}},
                {"slot": 1, "type": {"name": "grass", "url": "https://pokeapi.co/api/v2/type/12/"}}
            ],
            "sprites": {
                "front_default": "https://sprites/1.png",
                "front_shiny": "https://sprites/shiny/1.png",
                "back_default": null
            }
        });

        let api: ApiCreature = serde_json::from_value(payload).unwrap();
        let creature = Creature::from(api);

        assert_eq!(creature.id, 1);
        assert_eq!(creature.name, "bulbasaur");
        assert_eq!(creature.categories, vec!["grass", "poison"]);
        assert_eq!(creature.primary_image.as_deref(), Some("https://sprites/1.png"));
        assert_eq!(creature.alternate_image.as_deref(), Some("https://sprites/shiny/1.png"));
        assert_eq!(creature.height, 7);
        assert_eq!(creature.weight, 69);
    }

    #[test]
    fn test_decode_missing_sprites() {
        let payload = serde_json::json!({
            "id": 10,
            "name": "caterpie",
            "types": [{"slot": 1, "type": {"name": "bug"}}],
            "sprites": {"front_default": null, "front_shiny": null}
        });

        let creature = Creature::from(serde_json::from_value::<ApiCreature>(payload).unwrap());
        assert!(creature.primary_image.is_none());
        assert!(creature.alternate_image.is_none());
        assert_eq!(creature.height, 0);
    }

    #[test]
    fn test_collection_orders_batch() {
        let collection = Collection::from_batch(vec![
            test_creature(3, "venusaur", &["grass"]),
            test_creature(1, "bulbasaur", &["grass"]),
            test_creature(2, "ivysaur", &["grass"]),
            test_creature(1, "bulbasaur", &["grass"]),
        ]);

        assert_eq!(collection.ids(), vec![1, 2, 3]);
        assert_eq!(collection.get(2).map(|c| c.name.as_str()), Some("ivysaur"));
        assert!(collection.get(4).is_none());
    }
}
