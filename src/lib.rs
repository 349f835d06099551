// Pokédex Gallery - Core Library
// Exposes all modules for use in the TUI, the web server, and tests

pub mod config;
pub mod creature;
pub mod db;
pub mod filter;
pub mod loader;
pub mod render;
pub mod session;
pub mod telemetry;
pub mod view_state;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::GalleryConfig;
pub use creature::{ApiCreature, Collection, Creature};
pub use db::{
    Event,
    export_csv, get_all_creatures, get_events_for_entity, insert_creatures, insert_event,
    open_database, setup_database, verify_count,
};
pub use filter::{CategorySelector, FilterQuery, ALL_CATEGORIES, CATEGORY_VOCABULARY};
pub use loader::{CatalogSource, FailurePolicy, FetchError, HttpCatalog, LoadReport, Loader, NetworkError};
pub use render::{badge_color, render, Badge, BadgeColor, Fragment, ImageRegion, Rendered};
pub use session::{LoadStatus, Session};
pub use view_state::{ImageVariant, ViewStates};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
