//! Integration tests for the entity pipelines and the orchestrator.
//!
//! The fixtures under `tests/fixtures` are small raw extracts named after
//! their source tables, read the same way the CLI reads them.

use pretty_assertions::assert_eq;
use polars::prelude::*;
use retail_cleaning::{
    ActionType, CleaningConfig, CleaningOrchestrator, CleaningStage, CsvTableSink,
    CsvTableSource, Entity, MemoryTables, SUMMARY_FILE_NAME, TableSource, pipeline_for,
    write_summary_report,
};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_raw(entity: Entity) -> DataFrame {
    CsvTableSource::new(fixtures_path())
        .read_table(entity.source_name())
        .expect("Failed to read fixture")
}

fn text(df: &DataFrame, column: &str, idx: usize) -> Option<String> {
    df.column(column)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .get(idx)
        .map(str::to_string)
}

fn float(df: &DataFrame, column: &str, idx: usize) -> Option<f64> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .get(idx)
}

// ============================================================================
// Users
// ============================================================================

#[test]
fn test_users_fixture() {
    let outcome = pipeline_for(Entity::Users)
        .clean(load_raw(Entity::Users), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    assert_eq!(data.height(), 3, "the all-NULL row should be dropped");
    assert!(data.column("__row_position").is_err());

    assert_eq!(text(data, "first_name", 0).as_deref(), Some("Sigfried"));
    assert_eq!(text(data, "last_name", 2).as_deref(), Some("Lawrence"));
    assert_eq!(text(data, "country_code", 1).as_deref(), Some("GB"));
    assert_eq!(text(data, "phone_number", 0).as_deref(), Some("004947905356"));
    assert_eq!(text(data, "phone_number", 2).as_deref(), Some("0044(0)2079460018"));
    assert_eq!(
        text(data, "address", 1).as_deref(),
        Some("Flat 4,Williams Lane,Stockport")
    );

    assert_eq!(data.column("date_of_birth").unwrap().dtype(), &DataType::Date);
    assert_eq!(text(data, "date_of_birth", 1).as_deref(), Some("1940-12-20"));
    assert_eq!(text(data, "join_date", 2).as_deref(), Some("2009-12-08"));

    assert_eq!(outcome.summary.rows_removed, 1);
}

#[test]
fn test_users_denylist_uses_raw_positions() {
    let config = CleaningConfig::builder()
        .user_row_denylist(vec![1, 2])
        .build()
        .unwrap();

    let outcome = pipeline_for(Entity::Users)
        .clean(load_raw(Entity::Users), &config)
        .unwrap();
    let data = &outcome.data;

    // Position 2 was already dropped as incomplete; only position 1 goes.
    assert_eq!(data.height(), 2);
    assert_eq!(text(data, "index", 0).as_deref(), Some("0"));
    assert_eq!(text(data, "index", 1).as_deref(), Some("3"));
    assert_eq!(outcome.summary.rows_removed, 2);
}

// ============================================================================
// Cards
// ============================================================================

#[test]
fn test_cards_fixture() {
    let outcome = pipeline_for(Entity::Cards)
        .clean(load_raw(Entity::Cards), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    assert_eq!(data.height(), 5, "cards never drop rows");
    assert_eq!(data.column("card_number").unwrap().dtype(), &DataType::String);
    assert_eq!(text(data, "card_number", 1).as_deref(), Some("4971858637664481"));

    for column in ["card_number", "expiry_date", "card_provider", "date_payment_confirmed"] {
        assert_eq!(text(data, column, 2), None, "column {column} should be null");
    }
    assert_eq!(text(data, "expiry_date", 0).as_deref(), Some("09/26"));

    assert_eq!(
        text(data, "date_payment_confirmed", 0).as_deref(),
        Some("2015-11-25")
    );
    assert_eq!(text(data, "date_payment_confirmed", 4), None);

    let stats = outcome.summary.coercion_for("date_payment_confirmed").unwrap();
    assert_eq!(stats.parsed, 2);
    assert_eq!(stats.degraded, 2);
    assert_eq!(stats.already_missing, 1);
    assert!(!outcome.summary.warnings.is_empty());
}

// ============================================================================
// Stores
// ============================================================================

#[test]
fn test_stores_fixture() {
    let outcome = pipeline_for(Entity::Stores)
        .clean(load_raw(Entity::Stores), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    assert_eq!(data.height(), 5);
    assert_eq!(outcome.summary.rows_invalidated, 2);

    // Invalidated rows keep their index and nothing else.
    assert_eq!(text(data, "index", 4).as_deref(), Some("4"));
    assert_eq!(text(data, "address", 4), None);
    assert_eq!(text(data, "store_code", 4), None);
    assert_eq!(float(data, "longitude", 4), None);

    assert_eq!(
        text(data, "address", 1).as_deref(),
        Some("Flat 72W,Sally isle,East Deantown")
    );
    assert_eq!(text(data, "continent", 3).as_deref(), Some("Europe"));
    assert_eq!(text(data, "staff_numbers", 3).as_deref(), Some("78"));
    assert_eq!(text(data, "opening_date", 3).as_deref(), Some("2012-03-07"));

    assert_eq!(data.column("latitude").unwrap().dtype(), &DataType::Float64);
    assert_eq!(float(data, "latitude", 3), Some(52.12346));
    assert_eq!(float(data, "longitude", 1), Some(-0.74934));
    assert_eq!(float(data, "longitude", 0), None);
}

// ============================================================================
// Products
// ============================================================================

#[test]
fn test_products_fixture() {
    let outcome = pipeline_for(Entity::Products)
        .clean(load_raw(Entity::Products), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    assert!(data.column("Unnamed: 0").is_err());
    assert_eq!(text(data, "index", 2).as_deref(), Some("2"));
    assert_eq!(text(data, "product_name", 2), None);
    assert_eq!(outcome.summary.rows_invalidated, 1);

    assert_eq!(text(data, "product_price", 0).as_deref(), Some("39.99"));

    assert_eq!(float(data, "weight", 0), Some(1.6));
    assert_eq!(float(data, "weight", 1), Some(1.2));
    assert_eq!(float(data, "weight", 2), None);
    assert_eq!(float(data, "weight", 3), Some(0.454));
    assert_eq!(float(data, "weight", 4), Some(0.077));

    assert_eq!(text(data, "date_added", 3).as_deref(), Some("1999-10-26"));
    assert!(
        outcome.summary.actions_of(ActionType::ColumnRenamed).next().is_some(),
        "rename should be recorded"
    );
}

#[test]
fn test_products_blank_index_header() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("products.csv"),
        ",product_price,weight,date_added\n0,£3.00,500g,2020-01-01\n",
    )
    .unwrap();

    let raw = CsvTableSource::new(dir.path())
        .read_table(Entity::Products.source_name())
        .unwrap();
    let outcome = pipeline_for(Entity::Products)
        .clean(raw, &CleaningConfig::default())
        .unwrap();

    assert_eq!(text(&outcome.data, "index", 0).as_deref(), Some("0"));
    assert_eq!(float(&outcome.data, "weight", 0), Some(0.5));
}

// ============================================================================
// Orders and Events
// ============================================================================

#[test]
fn test_orders_fixture() {
    let outcome = pipeline_for(Entity::Orders)
        .clean(load_raw(Entity::Orders), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    for dropped in ["first_name", "last_name", "1"] {
        assert!(data.column(dropped).is_err(), "{dropped} should be dropped");
    }
    assert_eq!(data.width(), 8);
    assert_eq!(data.height(), 2);
    assert_eq!(outcome.summary.columns_removed, 3);
    assert_eq!(text(data, "card_number", 1).as_deref(), Some("223293046046"));
}

#[test]
fn test_events_fixture() {
    let outcome = pipeline_for(Entity::Events)
        .clean(load_raw(Entity::Events), &CleaningConfig::default())
        .unwrap();
    let data = &outcome.data;

    assert_eq!(data.height(), 4);
    assert_eq!(outcome.summary.rows_invalidated, 2);
    assert_eq!(text(data, "year", 2), None);
    assert_eq!(text(data, "date_uuid", 2), None);
    assert_eq!(text(data, "month", 3).as_deref(), Some("2"));

    assert_eq!(data.column("timestamp").unwrap().dtype(), &DataType::Time);
    assert!(text(data, "timestamp", 0).is_some());
    assert_eq!(text(data, "timestamp", 1), None);

    let stats = outcome.summary.coercion_for("timestamp").unwrap();
    assert_eq!(stats.parsed, 2);
    assert_eq!(stats.degraded, 0);
}

// ============================================================================
// Orchestrator
// ============================================================================

#[test]
fn test_run_all_writes_every_warehouse_table() {
    let output = tempfile::tempdir().unwrap();
    let orchestrator = CleaningOrchestrator::builder().build().unwrap();

    let outcomes = orchestrator
        .run_all(
            &CsvTableSource::new(fixtures_path()),
            &CsvTableSink::new(output.path()),
        )
        .unwrap();

    let entities: Vec<Entity> = outcomes.iter().map(|o| o.entity).collect();
    assert_eq!(entities, Entity::all().to_vec());

    for entity in Entity::all() {
        let path = output.path().join(format!("{}.csv", entity.warehouse_table()));
        assert!(path.exists(), "{} should be written", path.display());
    }

    let stores = CsvTableSource::new(output.path())
        .read_table("dim_store_details")
        .unwrap();
    assert_eq!(stores.height(), 5);
    assert_eq!(text(&stores, "continent", 3).as_deref(), Some("Europe"));
}

#[test]
fn test_summary_report_after_run() {
    let output = tempfile::tempdir().unwrap();
    let tables = MemoryTables::default();
    let orchestrator = CleaningOrchestrator::builder().build().unwrap();

    let outcomes = orchestrator
        .run_many(
            &[Entity::Cards, Entity::Orders],
            &CsvTableSource::new(fixtures_path()),
            &tables,
        )
        .unwrap();
    let summaries: Vec<_> = outcomes.into_iter().map(|o| o.summary).collect();

    let path = write_summary_report(output.path(), &summaries).unwrap();
    assert_eq!(path, output.path().join(SUMMARY_FILE_NAME));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["entities"][0]["entity"], "cards");
    assert_eq!(json["entities"][1]["entity"], "orders");
    assert_eq!(json["entities"][1]["columns_removed"], 3);

    assert_eq!(
        tables.names(),
        vec!["dim_card_details".to_string(), "orders_table".to_string()]
    );
}

#[test]
fn test_run_reports_stages_in_order() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let orchestrator = CleaningOrchestrator::builder()
        .on_progress(move |update| {
            stages_clone.lock().unwrap().push((update.stage, update.progress));
        })
        .build()
        .unwrap();

    orchestrator
        .run(
            Entity::Events,
            &CsvTableSource::new(fixtures_path()),
            &MemoryTables::default(),
        )
        .unwrap();

    let stages = stages.lock().unwrap();
    let order: Vec<CleaningStage> = stages.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(
        order,
        vec![
            CleaningStage::Extracting,
            CleaningStage::Cleaning,
            CleaningStage::Cleaning,
            CleaningStage::Loading,
            CleaningStage::Complete,
        ]
    );
    assert_eq!(stages.first().map(|(_, p)| *p), Some(0.0));
    assert_eq!(stages.last().map(|(_, p)| *p), Some(1.0));
}

#[test]
fn test_run_fails_on_missing_source() {
    let empty = tempfile::tempdir().unwrap();
    let orchestrator = CleaningOrchestrator::builder().build().unwrap();

    let err = orchestrator
        .run(
            Entity::Users,
            &CsvTableSource::new(empty.path()),
            &MemoryTables::default(),
        )
        .unwrap_err();

    assert_eq!(err.error_code(), "SOURCE_NOT_FOUND");
}

#[test]
fn test_run_fails_fast_on_wrong_schema() {
    let tables = MemoryTables::default();
    tables.insert(
        Entity::Events.source_name(),
        df!("timestamp" => &["22:00:06"]).unwrap(),
    );
    let orchestrator = CleaningOrchestrator::builder().build().unwrap();

    let err = orchestrator.run(Entity::Events, &tables, &tables).unwrap_err();

    assert!(err.is_structural());
    assert!(tables.get("dim_date_times").is_none());
}
