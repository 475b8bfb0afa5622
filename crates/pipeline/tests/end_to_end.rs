//! Full runs against reference CSVs and a SQLite trade table on disk.

use approx::assert_relative_eq;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tradeflow_core::{Config, Error};
use tradeflow_pipeline::Pipeline;

const COMMODITIES: &str = "id,text\n1,Wood\n2,Oil\n3,Paper\n4,Tar\n";

// The second header starts a concatenated copy that must be ignored.
const COUNTRIES: &str = "\
id,text,reporterCodeIsoAlpha3,world_part
752,Sweden,SWE,Europe
578,Norway,NOR,Europe
643,Российская Федерация,RUS,Европа
id,text,reporterCodeIsoAlpha3,world_part
999,Ghost,GHO,Nowhere
";

struct Fixture {
    dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("commodities.csv"), COMMODITIES).unwrap();
        std::fs::write(dir.path().join("countries.csv"), COUNTRIES).unwrap();
        write_trade_db(&dir.path().join("trade.db"));

        let mut config = Config::default();
        config.sources.commodities_csv = dir.path().join("commodities.csv");
        config.sources.countries_csv = dir.path().join("countries.csv");
        config.sources.trade_db = dir.path().join("trade.db");
        config.output.artifact_path = dir.path().join("dashboard_data.json");
        Self { dir, config }
    }

    fn artifact_path(&self) -> PathBuf {
        self.config.output.artifact_path.clone()
    }

    fn artifact(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.artifact_path()).unwrap()).unwrap()
    }
}

fn write_trade_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE trade (
            period INTEGER,
            partnerCode INTEGER,
            cmdCode INTEGER,
            flowCode TEXT,
            primaryValue REAL
        );",
    )
    .unwrap();

    let insert = |period: i64, partner: i64, cmd: i64, flow: &str, value: f64| {
        conn.execute(
            "INSERT INTO trade VALUES (?1, ?2, ?3, ?4, ?5)",
            params![period, partner, cmd, flow, value],
        )
        .unwrap();
    };

    for year in 2012..=2023 {
        insert(year, 752, 1, "X", (year - 2000) as f64 * 1e9);
        insert(year, 578, 2, "M", 4e9);
    }
    insert(2021, 752, 3, "X", 0.5e9);
    insert(2012, 578, 4, "X", 5e9);
    // Unknown partner, and a partner only listed after the repeated header.
    insert(2023, 111, 3, "X", 1e9);
    insert(2023, 999, 3, "M", 2e9);
    insert(2023, 643, 2, "M", 3e9);
    // Repeat of (2023, 752, 1, X): the first row wins.
    insert(2023, 752, 1, "X", 99e9);
    insert(2023, 752, 1, "RX", 5e9);
    conn.execute(
        "INSERT INTO trade VALUES (?1, ?2, ?3, ?4, ?5)",
        params![2023, 752, 2, "X", "n/a"],
    )
    .unwrap();
}

fn find<'a>(rows: &'a Value, field: &str, name: &str) -> &'a Value {
    rows.as_array()
        .unwrap()
        .iter()
        .find(|row| row[field] == name)
        .unwrap_or_else(|| panic!("no row with {field} = {name}"))
}

#[test]
fn test_full_run_summary() {
    let fixture = Fixture::new();
    let summary = Pipeline::new(fixture.config.clone()).run().unwrap();

    assert_eq!(summary.trade_rows, 32);
    assert_eq!(summary.dropped_rows, 1);
    assert_eq!(summary.invalid_flow, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.records, 29);
    assert_eq!(summary.artifact_path, fixture.artifact_path());
    for key in ["trade_dynamics", "record_count", "generated_at", "export_growth", "import_growth"] {
        assert!(summary.keys_written.iter().any(|k| k == key), "missing {key}");
    }
}

#[test]
fn test_full_run_artifact() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();
    let artifact = fixture.artifact();

    for key in [
        "trade_dynamics",
        "top_export_commodities",
        "top_import_commodities",
        "economic_sectors",
        "trade_geography",
        "top_partner_countries",
        "declining_commodities",
        "declining_partners",
        "russia_trade_dynamics",
        "years",
        "regions",
        "countries",
        "commodities",
        "record_count",
        "generated_at",
        "export_growth",
        "import_growth",
    ] {
        assert!(artifact.get(key).is_some(), "missing {key}");
    }
    assert_eq!(artifact["record_count"], 29);

    let dynamics = artifact["trade_dynamics"].as_array().unwrap();
    assert_eq!(dynamics.len(), 12);
    assert_eq!(dynamics[0]["year"], 2012);
    let latest = &dynamics[11];
    assert_eq!(latest["year"], 2023);
    assert_relative_eq!(latest["X"].as_f64().unwrap(), 24e9);
    assert_relative_eq!(latest["M"].as_f64().unwrap(), 9e9);
    assert_relative_eq!(latest["balance"].as_f64().unwrap(), 15e9);

    let top_partner = &artifact["top_partner_countries"][0];
    assert_eq!(top_partner["country_name"], "Sweden");
    assert_relative_eq!(top_partner["turnover_bln"].as_f64().unwrap(), 105.5);

    let sectors = artifact["economic_sectors"].as_array().unwrap();
    assert_eq!(sectors.len(), 1);
    assert_eq!(sectors[0]["sector"], "Unknown");
    assert_relative_eq!(sectors[0]["export_share"].as_f64().unwrap(), 1.0);

    let russia = artifact["russia_trade_dynamics"].as_array().unwrap();
    assert_eq!(russia.len(), 1);
    assert_eq!(russia[0]["year"], 2023);
    assert_relative_eq!(russia[0]["M"].as_f64().unwrap(), 3e9);
}

#[test]
fn test_unmatched_partner_resolves_to_sentinel() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();
    let artifact = fixture.artifact();

    assert_eq!(
        artifact["countries"],
        json!(["Norway", "Sweden", "Unknown", "Российская Федерация"])
    );
    assert_eq!(artifact["regions"], json!(["Europe", "Unknown", "Европа"]));

    let unknown = find(&artifact["trade_geography"], "world_part", "Unknown");
    assert_relative_eq!(unknown["X"].as_f64().unwrap(), 1e9);
    assert_relative_eq!(unknown["M"].as_f64().unwrap(), 2e9);
}

#[test]
fn test_rows_after_repeated_header_ignored() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();
    let artifact = fixture.artifact();

    let countries = artifact["countries"].as_array().unwrap();
    assert!(!countries.iter().any(|c| c == "Ghost" || c == "text"));
    let regions = artifact["regions"].as_array().unwrap();
    assert!(!regions.iter().any(|r| r == "Nowhere" || r == "world_part"));
}

#[test]
fn test_structural_change_and_growth() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();
    let artifact = fixture.artifact();

    let declining = artifact["declining_commodities"].as_array().unwrap();
    assert_eq!(declining.len(), 1);
    assert_eq!(declining[0]["commodity_name"], "Tar");
    assert_relative_eq!(declining[0]["change"].as_f64().unwrap(), -5e9);

    let partners = artifact["declining_partners"].as_array().unwrap();
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0]["country_name"], "Norway");

    let growth = artifact["export_growth"].as_array().unwrap();
    assert_eq!(growth.len(), 2);
    assert_eq!(growth[0]["commodity_name"], "Wood");
    assert_relative_eq!(growth[0]["delta"].as_f64().unwrap(), 2.0);
    assert_eq!(growth[1]["commodity_name"], "Paper");
    assert_relative_eq!(growth[1]["delta"].as_f64().unwrap(), 0.5);

    let imports = artifact["import_growth"].as_array().unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0]["commodity_name"], "Oil");
    assert_relative_eq!(imports[0]["delta"].as_f64().unwrap(), 3.0);
}

#[test]
fn test_growth_disabled_skips_augmentation() {
    let mut fixture = Fixture::new();
    fixture.config.growth.enabled = false;
    let summary = Pipeline::new(fixture.config.clone()).run().unwrap();

    assert!(!summary.keys_written.iter().any(|k| k == "export_growth"));
    assert!(fixture.artifact().get("export_growth").is_none());
}

#[test]
fn test_augmentation_preserves_existing_keys() {
    let fixture = Fixture::new();
    std::fs::write(fixture.artifact_path(), r#"{"a": 1}"#).unwrap();

    let summary = Pipeline::new(fixture.config.clone())
        .run_growth_augmentation()
        .unwrap();
    assert_eq!(summary.keys_written, vec!["export_growth", "import_growth"]);

    let artifact = fixture.artifact();
    assert_eq!(artifact["a"], 1);
    assert!(artifact.get("trade_dynamics").is_none());
    assert_eq!(artifact["export_growth"].as_array().unwrap().len(), 2);
}

#[test]
fn test_augmentation_requires_artifact() {
    let fixture = Fixture::new();
    let err = Pipeline::new(fixture.config.clone())
        .run_growth_augmentation()
        .unwrap_err();
    assert_eq!(err.stage(), Some("export"));
    assert!(!fixture.artifact_path().exists());
}

#[test]
fn test_missing_trade_table_keeps_previous_artifact() {
    let fixture = Fixture::new();
    std::fs::write(fixture.artifact_path(), r#"{"previous": true}"#).unwrap();

    let empty_db = fixture.dir.path().join("empty.db");
    Connection::open(&empty_db)
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER);")
        .unwrap();
    let mut config = fixture.config.clone();
    config.sources.trade_db = empty_db;

    let err = Pipeline::new(config).run().unwrap_err();
    assert_eq!(err.stage(), Some("load"));
    match err {
        Error::Stage { source, .. } => assert!(matches!(*source, Error::SourceUnavailable(_))),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.artifact(), json!({"previous": true}));
}

#[test]
fn test_strict_coercion_fails_batch() {
    let mut fixture = Fixture::new();
    fixture.config.reconcile.strict_coercion = true;

    let err = Pipeline::new(fixture.config.clone()).run().unwrap_err();
    assert_eq!(err.stage(), Some("reconcile"));
    assert!(!fixture.artifact_path().exists());
}
