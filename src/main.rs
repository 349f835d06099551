// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::Path;

// Use library instead of local modules
use pokedex_gallery::{
    export_csv, get_all_creatures, get_events_for_entity, insert_creatures, insert_event,
    open_database, telemetry, verify_count, Event, GalleryConfig, Loader,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = GalleryConfig::resolve()?;

    match args.get(1).map(String::as_str) {
        Some("import") => {
            telemetry::init("info");
            run_import(&config)?;
        }
        Some("export") => {
            telemetry::init("info");
            let target = args.get(2).context("usage: pokedex export <file.csv>")?;
            run_export(&config, Path::new(target))?;
        }
        Some("events") => {
            telemetry::init("warn");
            run_events(&config, args.get(2).map(String::as_str))?;
        }
        _ => {
            // Keep the alternate screen clean unless asked otherwise
            telemetry::init("error");
            let offline = args.iter().any(|a| a == "--offline");
            run_ui_mode(&config, offline)?;
        }
    }

    Ok(())
}

fn run_import(config: &GalleryConfig) -> Result<()> {
    println!("🗄️  Catalog Import - PokéAPI → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let range = catalog_key(config);

    // 1. Fetch catalog
    println!("\n🌐 Fetching creatures {}...", range);
    let loader = Loader::from_config(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(loader.load(config.id_range()));

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let conn = open_database(&config.database_path)?;
    println!("✓ Database initialized with WAL mode");

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            let event = Event::new(
                "load_failed",
                "catalog",
                &range,
                serde_json::json!({ "id": err.id, "error": err.to_string() }),
                "importer",
            );
            insert_event(&conn, &event)?;
            eprintln!("❌ {}", err);
            return Err(err.into());
        }
    };
    println!("✓ Fetched {} creatures", report.collection.len());
    for failure in &report.failures {
        println!("⚠️  Skipped: {}", failure);
    }

    // 3. Insert creatures
    println!("\n💾 Writing snapshot...");
    let written = insert_creatures(&conn, report.collection.as_slice())?;

    let event = Event::new(
        "catalog_imported",
        "catalog",
        &range,
        serde_json::json!({
            "count": written,
            "failed": report.failures.iter().map(|f| f.id).collect::<Vec<_>>(),
        }),
        "importer",
    );
    insert_event(&conn, &event)?;

    // 4. Verify count
    println!("\n🔍 Verifying database...");
    let count = verify_count(&conn)?;
    println!("✓ Database contains {} creatures", count);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Import complete: {}", config.database_path.display());

    Ok(())
}

fn run_export(config: &GalleryConfig, target: &Path) -> Result<()> {
    println!("📤 Exporting snapshot to {}", target.display());

    if !config.database_path.exists() {
        eprintln!("❌ Database not found!");
        eprintln!("   Run: cargo run import");
        eprintln!("   to fetch the catalog first.");
        std::process::exit(1);
    }

    let conn = open_database(&config.database_path)?;
    let collection = get_all_creatures(&conn)?;
    let written = export_csv(target, &collection)?;

    println!("✓ Exported {} creatures", written);

    Ok(())
}

/// Audit-log key of one catalog range, e.g. `1-200`
fn catalog_key(config: &GalleryConfig) -> String {
    format!("{}-{}", config.first_id, config.last_id)
}

fn describe_event(event: &Event) -> String {
    format!(
        "{}  {:<17} {}  ({})",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.event_type,
        event.data,
        event.actor
    )
}

fn run_events(config: &GalleryConfig, range: Option<&str>) -> Result<()> {
    let key = range.map_or_else(|| catalog_key(config), str::to_string);
    println!("📜 Import history for catalog {}", key);

    if !config.database_path.exists() {
        eprintln!("❌ Database not found!");
        eprintln!("   Run: cargo run import");
        eprintln!("   to fetch the catalog first.");
        std::process::exit(1);
    }

    let conn = open_database(&config.database_path)?;
    let events = get_events_for_entity(&conn, "catalog", &key)?;

    if events.is_empty() {
        println!("   (no events)");
    }
    for event in &events {
        println!("   {}", describe_event(event));
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &GalleryConfig, offline: bool) -> Result<()> {
    use pokedex_gallery::Session;
    use ui::UiOutcome;

    println!("🖥️  Loading Pokédex...\n");

    let runtime = tokio::runtime::Runtime::new()?;
    let loader = Loader::from_config(config)?;

    let mut session = if offline {
        if !config.database_path.exists() {
            eprintln!("❌ Database not found!");
            eprintln!("   Run: cargo run import");
            eprintln!("   to fetch the catalog first.");
            std::process::exit(1);
        }
        let conn = open_database(&config.database_path)?;
        Session::from_collection(get_all_creatures(&conn)?)
    } else {
        let mut session = Session::new();
        // A failed load still opens the UI, which shows the error and offers retry
        if let Err(err) = runtime.block_on(session.load(&loader, config.id_range())) {
            eprintln!("❌ {}", err);
        }
        session
    };

    println!("✓ Loaded {} creatures\n", session.collection().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    loop {
        let mut app = ui::App::new(session);
        let outcome = ui::run_ui(&mut app)?;
        session = app.session;

        match outcome {
            UiOutcome::Quit => break,
            UiOutcome::Reload => {
                println!("🔄 Reloading Pokédex...");
                if let Err(err) = runtime.block_on(session.load(&loader, config.id_range())) {
                    eprintln!("❌ {}", err);
                }
            }
        }
    }

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &GalleryConfig, _offline: bool) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin pokedex-server --features server");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokedex_gallery::setup_database;
    use rusqlite::Connection;

    #[test]
    fn test_import_events_are_found_by_catalog_key() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let config = GalleryConfig {
            first_id: 1,
            last_id: 3,
            ..GalleryConfig::default()
        };

        let event = Event::new(
            "catalog_imported",
            "catalog",
            &catalog_key(&config),
            serde_json::json!({ "count": 3 }),
            "importer",
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "catalog", "1-3").unwrap();
        assert_eq!(events.len(), 1);
        let line = describe_event(&events[0]);
        assert!(line.contains("catalog_imported"));
        assert!(line.contains(r#"{"count":3}"#));
        assert!(line.contains("(importer)"));
    }
}
