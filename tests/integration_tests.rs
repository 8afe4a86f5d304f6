use httpmock::prelude::*;
use serde_json::{json, Map, Value};
use spurious_ireland::core::jsonstat::decode_records;
use spurious_ireland::domain::model::DimensionNaming;
use spurious_ireland::{CliConfig, EtlEngine, LocalStorage, SpuriousPipeline, TomlConfig};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

/// Builds a JSON-stat 2.0 dataset; `dims` are (id, label, categories) in row-major order.
fn cube(dims: &[(&str, &str, Vec<&str>)], values: Vec<Value>) -> Value {
    let mut dimension = Map::new();
    for (id, label, categories) in dims {
        let labels: Map<String, Value> = categories
            .iter()
            .map(|c| (c.to_string(), Value::from(*c)))
            .collect();
        dimension.insert(
            id.to_string(),
            json!({"label": label, "category": {"index": categories, "label": labels}}),
        );
    }

    json!({
        "version": "2.0",
        "class": "dataset",
        "id": dims.iter().map(|(id, _, _)| *id).collect::<Vec<_>>(),
        "size": dims.iter().map(|(_, _, c)| c.len()).collect::<Vec<_>>(),
        "dimension": dimension,
        "value": values
    })
}

const YEARS: &[&str] = &["2021", "2022", "2023"];

fn potato_cube() -> Value {
    cube(
        &[
            ("STATISTIC", "Statistic", vec!["Crop Yield per Hectare"]),
            ("TLIST(A1)", "Year", YEARS.to_vec()),
            ("C02328V02808", "Type of Crop", vec!["Potatoes", "Barley"]),
        ],
        vec![json!(34), json!(7), json!(32), json!(8), json!(35), json!(7.5)],
    )
}

fn migration_cube() -> Value {
    cube(
        &[
            ("STATISTIC", "Statistic", vec!["Estimated Migration"]),
            ("TLIST(A1)", "Year", YEARS.to_vec()),
            ("C01", "Component", vec!["Net migration", "Immigrants"]),
        ],
        vec![json!(11.6), json!(121.7), json!(18.5), json!(120.7), json!(52.1), json!(141.6)],
    )
}

fn marriages_cube() -> Value {
    cube(
        &[
            ("STATISTIC", "Statistic", vec!["Marriages"]),
            ("TLIST(A1)", "Year", YEARS.to_vec()),
        ],
        vec![json!(18500), json!(21900), json!(22800)],
    )
}

fn gdp_cube() -> Value {
    let quarters: Vec<String> = YEARS
        .iter()
        .flat_map(|y| (1..=4).map(move |q| format!("{}Q{}", y, q)))
        .collect();
    let quarters: Vec<&str> = quarters.iter().map(String::as_str).collect();
    cube(
        &[
            ("STATISTIC", "Statistic", vec!["Percentage Change Over Previous Period"]),
            ("TLIST(Q1)", "Quarter", quarters),
        ],
        [1, 2, 3, 4, 2, 2, 2, 2, -1, 0, 1, -4]
            .iter()
            .map(|v| json!(v))
            .collect(),
    )
}

fn read_entry(archive_path: &Path, name: &str) -> String {
    let zip_data = std::fs::read(archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_report_from_cso_api() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let mocks = [
        ("AQA04", potato_cube()),
        ("PEA15", migration_cube()),
        ("VSA01", marriages_cube()),
        ("NQQ28", gdp_cube()),
    ]
    .map(|(table, body)| {
        server.mock(|when, then| {
            when.method(GET).path(format!("/cso/{}/JSON-stat/2.0/en", table));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
    });

    let config = CliConfig {
        api_base: server.url("/cso"),
        output_path: output_path.clone(),
        timeout_seconds: 5,
        ..CliConfig::default()
    };

    let storage = LocalStorage::new(&output_path);
    let pipeline = SpuriousPipeline::new(storage, config).unwrap();
    let engine = EtlEngine::new_with_monitoring(pipeline, false);
    let result = engine.run().await;

    for mock in &mocks {
        mock.assert();
    }
    let output_file_path = result.unwrap();
    assert!(output_file_path.ends_with("spurious_report.zip"));

    let archive_path = Path::new(&output_path).join("spurious_report.zip");
    assert!(archive_path.exists());

    assert_eq!(
        read_entry(&archive_path, "merged.csv"),
        "Year,potato_yield,net_migration,marriages,gdp_growth\n\
         2021,34,11.6,18500,2.5\n\
         2022,32,18.5,21900,2\n\
         2023,35,52.1,22800,-1\n"
    );
    assert!(read_entry(&archive_path, "merged.tsv").starts_with("Year\tpotato_yield\t"));

    let correlations: Value =
        serde_json::from_str(&read_entry(&archive_path, "correlations.json")).unwrap();
    let potato = &correlations[0];
    assert_eq!(potato["key"], "potato_migration");
    assert_eq!(potato["years"], json!({"from": 2021, "to": 2023}));
    let r = potato["range_r"].as_f64().unwrap();
    assert!((-1.0..=1.0).contains(&r));

    let figure: Value =
        serde_json::from_str(&read_entry(&archive_path, "marriages_gdp.figure.json")).unwrap();
    assert_eq!(figure["data"][1]["type"], "bar");
    assert_eq!(figure["data"][1]["y"], json!([2.5, 2.0, -1.0]));

    let markdown = read_entry(&archive_path, "report.md");
    assert!(markdown.contains(&format!("### Potato Yields & Migration: r = {}", r)));
}

#[tokio::test]
async fn test_failed_table_falls_back_to_sample() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let ok_mocks = [
        ("AQA04", potato_cube()),
        ("VSA01", marriages_cube()),
        ("NQQ28", gdp_cube()),
    ]
    .map(|(table, body)| {
        server.mock(|when, then| {
            when.method(GET).path(format!("/cso/{}/JSON-stat/2.0/en", table));
            then.status(200).json_body(body);
        })
    });
    let failing_mock = server.mock(|when, then| {
        when.method(GET).path("/cso/PEA15/JSON-stat/2.0/en");
        then.status(503);
    });

    let config = CliConfig {
        api_base: server.url("/cso"),
        output_path: output_path.clone(),
        timeout_seconds: 5,
        ..CliConfig::default()
    };

    let pipeline = SpuriousPipeline::new(LocalStorage::new(&output_path), config).unwrap();
    EtlEngine::new(pipeline).run().await.unwrap();

    for mock in &ok_mocks {
        mock.assert();
    }
    failing_mock.assert();

    let csv = read_entry(&Path::new(&output_path).join("spurious_report.zip"), "merged.csv");
    let lines: Vec<&str> = csv.lines().collect();
    // header plus 2010-2023 from the bundled migration sample
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[1], "2010,,-27,,");
    assert_eq!(lines[12], "2021,34,11,18500,2.5");
}

#[tokio::test]
async fn test_offline_run_with_year_window() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("reports").to_str().unwrap().to_string();

    let config = CliConfig {
        output_path: output_path.clone(),
        offline: true,
        from_year: Some(2015),
        to_year: Some(2020),
        comparisons_selected: vec!["potato_migration".to_string()],
        ..CliConfig::default()
    };

    let pipeline = SpuriousPipeline::new(LocalStorage::new(&output_path), config).unwrap();
    EtlEngine::new(pipeline).run().await.unwrap();

    let archive_path = Path::new(&output_path).join("spurious_report.zip");
    let markdown = read_entry(&archive_path, "report.md");
    assert!(markdown.contains("Years 2015 to 2020 (all years: r = "));
    assert!(!markdown.contains("Marriage Rates"));

    let csv = read_entry(&archive_path, "merged.csv");
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.contains("\n2015,37,5,23600,25.2\n"));
}

#[tokio::test]
async fn test_offline_run_from_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let content = format!(
        "[report]\nname = \"offline\"\ncomparisons = [\"marriages_gdp\"]\n\n\
         [source]\noffline = true\n\n[output]\noutput_path = \"{}\"\n",
        output_path
    );
    let config = TomlConfig::from_toml_str(&content).unwrap();

    let pipeline = SpuriousPipeline::new(LocalStorage::new(&output_path), config).unwrap();
    let result = EtlEngine::new(pipeline).run().await.unwrap();
    assert!(result.ends_with("spurious_report.zip"));

    let correlations: Value = serde_json::from_str(&read_entry(
        &Path::new(&output_path).join("spurious_report.zip"),
        "correlations.json",
    ))
    .unwrap();
    assert_eq!(correlations.as_array().unwrap().len(), 1);
    assert_eq!(correlations[0]["years"], json!({"from": 2010, "to": 2023}));
}

#[test]
fn test_decode_records_flattens_json_stat_document() {
    let document = cube(
        &[
            ("TLIST(A1)", "Year", vec!["2022", "2023"]),
            ("C02199V02655", "Sex", vec!["Male", "Female"]),
        ],
        vec![json!(1), json!(2), Value::Null, json!(4)],
    );

    let records = decode_records(document.to_string().as_bytes(), DimensionNaming::Label).unwrap();

    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"Year": "2022", "Sex": "Male", "value": 1.0},
            {"Year": "2022", "Sex": "Female", "value": 2.0},
            {"Year": "2023", "Sex": "Male", "value": null},
            {"Year": "2023", "Sex": "Female", "value": 4.0},
        ])
    );
}
