use myskoda_connect::core::catalog::{self, CatalogFormat};
use myskoda_connect::{ApiBase, Endpoint};

#[test]
fn test_csv_catalog_lists_every_endpoint() {
    let base = ApiBase::new("http://localhost:8080/", "http://localhost:8081");
    let output = catalog::render(CatalogFormat::Csv, &base).unwrap();

    let mut reader = csv::Reader::from_reader(output.as_bytes());
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), Endpoint::ALL.len());

    let disabled: Vec<&str> = records
        .iter()
        .filter(|r| &r[4] == "true")
        .map(|r| &r[0])
        .collect();
    assert_eq!(disabled, vec!["vehicle-wakeup"]);

    let authorize = records.iter().find(|r| &r[0] == "oidc-authorize").unwrap();
    assert_eq!(&authorize[2], "http://localhost:8081/oidc/v1/authorize");

    let positions = records.iter().find(|r| &r[0] == "positions").unwrap();
    assert_eq!(&positions[1], "GET");
    assert_eq!(
        &positions[2],
        "http://localhost:8080/api/v1/maps/positions?vin={vin}"
    );
}

#[test]
fn test_json_catalog_round_trips_names() {
    let output = catalog::render(CatalogFormat::Json, &ApiBase::default()).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();

    for (row, endpoint) in rows.iter().zip(Endpoint::ALL.iter()) {
        let name = row["name"].as_str().unwrap();
        assert_eq!(name.parse::<Endpoint>().unwrap(), *endpoint);
    }
    assert_eq!(
        rows.iter().filter(|r| r["disabled"] == false).count(),
        catalog::EXPECTED_ACTIVE
    );
}

#[test]
fn test_catalog_check_passes() {
    assert!(catalog::check().is_empty());
    let totals = catalog::summary();
    assert_eq!(
        (totals.active, totals.disabled),
        (catalog::EXPECTED_ACTIVE, catalog::EXPECTED_DISABLED)
    );
}
