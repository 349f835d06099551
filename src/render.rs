// 🎴 Card Renderer - Collection → display fragments
//
// One fragment per creature, in input order. Every render replaces the
// previous output wholesale; there is no diffing.

use crate::creature::{Collection, Creature};
use crate::view_state::{ImageVariant, ViewStates};
use serde::Serialize;

/// Source units (dm, hg) to display units (m, kg).
pub const MEASUREMENT_SCALE: f64 = 0.1;

// ============================================================================
// CATEGORY PALETTE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeColor {
    /// Style class used by the HTML surface
    pub class: &'static str,
    /// Same color as RGB for terminal surfaces
    pub rgb: (u8, u8, u8),
}

pub const DEFAULT_BADGE_COLOR: BadgeColor = BadgeColor {
    class: "bg-gray-400",
    rgb: (156, 163, 175),
};

const PALETTE: [(&str, BadgeColor); 18] = [
    ("normal", BadgeColor { class: "bg-gray-400", rgb: (156, 163, 175) }),
    ("fire", BadgeColor { class: "bg-red-500", rgb: (239, 68, 68) }),
    ("water", BadgeColor { class: "bg-blue-500", rgb: (59, 130, 246) }),
    ("electric", BadgeColor { class: "bg-yellow-400", rgb: (250, 204, 21) }),
    ("grass", BadgeColor { class: "bg-green-500", rgb: (34, 197, 94) }),
    ("ice", BadgeColor { class: "bg-blue-200", rgb: (191, 219, 254) }),
    ("fighting", BadgeColor { class: "bg-red-700", rgb: (185, 28, 28) }),
    ("poison", BadgeColor { class: "bg-purple-500", rgb: (168, 85, 247) }),
    ("ground", BadgeColor { class: "bg-yellow-600", rgb: (202, 138, 4) }),
    ("flying", BadgeColor { class: "bg-indigo-400", rgb: (129, 140, 248) }),
    ("psychic", BadgeColor { class: "bg-pink-500", rgb: (236, 72, 153) }),
    ("bug", BadgeColor { class: "bg-green-400", rgb: (74, 222, 128) }),
    ("rock", BadgeColor { class: "bg-yellow-800", rgb: (133, 77, 14) }),
    ("ghost", BadgeColor { class: "bg-purple-700", rgb: (126, 34, 206) }),
    ("dragon", BadgeColor { class: "bg-indigo-700", rgb: (67, 56, 202) }),
    ("dark", BadgeColor { class: "bg-gray-800", rgb: (31, 41, 55) }),
    ("steel", BadgeColor { class: "bg-gray-500", rgb: (107, 114, 128) }),
    ("fairy", BadgeColor { class: "bg-pink-300", rgb: (249, 168, 212) }),
];

pub fn badge_color(category: &str) -> BadgeColor {
    PALETTE
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_BADGE_COLOR)
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub name: String,
    pub color: BadgeColor,
}

/// Clickable sprite area of a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRegion {
    pub creature_id: u32,
    pub variant: ImageVariant,
    /// Locator currently displayed
    pub src: Option<String>,
    pub primary_src: Option<String>,
    pub alternate_src: Option<String>,
    pub label: &'static str,
    pub label_classes: &'static [&'static str],
}

impl ImageRegion {
    pub fn new(creature: &Creature, variant: ImageVariant) -> Self {
        let src = match variant {
            ImageVariant::Primary => creature.primary_image.clone(),
            ImageVariant::Alternate => creature.alternate_image.clone(),
        };

        Self {
            creature_id: creature.id,
            variant,
            src,
            primary_src: creature.primary_image.clone(),
            alternate_src: creature.alternate_image.clone(),
            label: variant.label(),
            label_classes: variant.label_classes(),
        }
    }

    pub fn to_html(&self, alt: &str) -> String {
        format!(
            r#"<div class="image-region" data-creature-id="{id}">
  <img src="{src}" alt="{alt}" data-primary-src="{primary}" data-alternate-src="{alternate}" />
  <span class="variant-label {classes}" data-variant="{variant}">{label}</span>
</div>"#,
            id = self.creature_id,
            src = escape_html(self.src.as_deref().unwrap_or("")),
            alt = escape_html(alt),
            primary = escape_html(self.primary_src.as_deref().unwrap_or("")),
            alternate = escape_html(self.alternate_src.as_deref().unwrap_or("")),
            classes = self.label_classes.join(" "),
            variant = match self.variant {
                ImageVariant::Primary => "primary",
                ImageVariant::Alternate => "alternate",
            },
            label = self.label,
        )
    }
}

/// Self-contained display unit for one creature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub id: u32,
    pub number: String,
    pub name: String,
    pub badges: Vec<Badge>,
    pub height_m: String,
    pub weight_kg: String,
    pub image: ImageRegion,
}

impl Fragment {
    pub fn new(creature: &Creature, variant: ImageVariant) -> Self {
        Self {
            id: creature.id,
            number: format_number(creature.id),
            name: creature.name.clone(),
            badges: creature
                .categories
                .iter()
                .map(|name| Badge {
                    name: name.clone(),
                    color: badge_color(name),
                })
                .collect(),
            height_m: format_measurement(creature.height),
            weight_kg: format_measurement(creature.weight),
            image: ImageRegion::new(creature, variant),
        }
    }

    pub fn to_html(&self) -> String {
        let badges: String = self
            .badges
            .iter()
            .map(|b| {
                format!(
                    r#"<span class="type-badge {}">{}</span>"#,
                    b.color.class,
                    escape_html(&b.name)
                )
            })
            .collect();

        format!(
            r#"<article class="creature-card" data-creature-id="{id}">
<header><h2 class="capitalize">{name}</h2><p class="number">{number}</p></header>
{image}
<div class="badges">{badges}</div>
<dl class="measurements"><dt>Height</dt><dd>{height}m</dd><dt>Weight</dt><dd>{weight}kg</dd></dl>
</article>"#,
            id = self.id,
            name = escape_html(&self.name),
            number = self.number,
            image = self.image.to_html(&self.name),
            badges = badges,
            height = self.height_m,
            weight = self.weight_kg,
        )
    }
}

/// `#001`, `#025`, `#1025`
pub fn format_number(id: u32) -> String {
    format!("#{:03}", id)
}

pub fn format_measurement(raw: u32) -> String {
    format!("{:.1}", raw as f64 * MEASUREMENT_SCALE)
}

// ============================================================================
// RENDER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "cards", rename_all = "snake_case")]
pub enum Rendered {
    /// Empty-result indicator visible, no fragments
    Empty,
    Cards(Vec<Fragment>),
}

impl Rendered {
    pub fn fragments(&self) -> &[Fragment] {
        match self {
            Rendered::Empty => &[],
            Rendered::Cards(cards) => cards,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Rendered::Empty)
    }

    pub fn to_html(&self) -> String {
        match self {
            Rendered::Empty => {
                r#"<div id="no-creatures-found" class="empty-result">No creatures found.</div>"#
                    .to_string()
            }
            Rendered::Cards(cards) => {
                let body: Vec<String> = cards.iter().map(Fragment::to_html).collect();
                format!(r#"<section id="creature-list">{}</section>"#, body.join("\n"))
            }
        }
    }
}

/// Render a collection using the card states in `views`; cards missing from
/// `views` show their primary image.
pub fn render(collection: &Collection, views: &ViewStates) -> Rendered {
    if collection.is_empty() {
        return Rendered::Empty;
    }

    Rendered::Cards(
        collection
            .iter()
            .map(|c| Fragment::new(c, views.get(c.id).unwrap_or_default()))
            .collect(),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::test_creature;

    #[test]
    fn test_empty_collection_renders_empty_state() {
        let rendered = render(&Collection::new(), &ViewStates::default());
        assert!(rendered.is_empty());
        assert!(rendered.fragments().is_empty());
        assert!(rendered.to_html().contains("no-creatures-found"));
    }

    #[test]
    fn test_fragment_layout() {
        let creature = test_creature(1, "bulbasaur", &["grass", "poison"]);
        let fragment = Fragment::new(&creature, ImageVariant::Primary);

        assert_eq!(fragment.number, "#001");
        assert_eq!(fragment.height_m, "0.7");
        assert_eq!(fragment.weight_kg, "6.9");
        assert_eq!(fragment.badges[0].color.class, "bg-green-500");
        assert_eq!(fragment.badges[1].color.class, "bg-purple-500");
        assert_eq!(fragment.image.src, creature.primary_image);
        assert_eq!(fragment.image.label, "Normal");
    }

    #[test]
    fn test_unknown_category_gets_default_color() {
        assert_eq!(badge_color("shadow"), DEFAULT_BADGE_COLOR);
        assert_eq!(badge_color("fire").class, "bg-red-500");
    }

    #[test]
    fn test_number_padding() {
        assert_eq!(format_number(7), "#007");
        assert_eq!(format_number(25), "#025");
        assert_eq!(format_number(151), "#151");
        assert_eq!(format_number(1025), "#1025");
        assert_eq!(format_measurement(1000), "100.0");
        assert_eq!(format_measurement(0), "0.0");
    }

    #[test]
    fn test_render_preserves_order_and_states() {
        let collection = Collection::from_batch(vec![
            test_creature(4, "charmander", &["fire"]),
            test_creature(1, "bulbasaur", &["grass"]),
        ]);
        let mut views = ViewStates::reset(collection.ids());
        views.toggle(4);

        let rendered = render(&collection, &views);
        let ids: Vec<u32> = rendered.fragments().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 4]);

        let charmander = &rendered.fragments()[1];
        assert_eq!(charmander.image.variant, ImageVariant::Alternate);
        assert_eq!(charmander.image.src.as_deref(), Some("https://img.example/shiny/4.png"));
        assert_eq!(charmander.image.label, "✨ Shiny");
    }

    #[test]
    fn test_html_is_escaped() {
        let creature = test_creature(3, "<script>mr. mime</script>", &["psychic"]);
        let html = Fragment::new(&creature, ImageVariant::Primary).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;mr. mime"));
        assert!(html.contains("bg-pink-500"));
        assert!(html.contains(r#"data-creature-id="3""#));
    }
}
