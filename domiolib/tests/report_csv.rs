use domiolib::error::DomioError;
use domiolib::formats::csv::Csv;
use domiolib::formats::json::Json;
use domiolib::model::{EmissionStatus, SettlementReport, UnitDistribution, UnitStatus};
use domiolib::traits::{ReadFormat, WriteFormat};
use rust_decimal::Decimal;
use std::io::Cursor;

fn report() -> SettlementReport {
    let mut dist = UnitDistribution::new("u-01", "em-1");
    dist.principal = Decimal::new(50_111_01, 2);
    dist.interest = Decimal::new(771_67, 2);
    dist.paid_principal = Decimal::new(100, 0);
    dist.status = UnitStatus::Partial;

    SettlementReport {
        emission_id: "em-1".into(),
        status: EmissionStatus::Partial,
        total: Decimal::new(50_111_01, 2),
        paid: Decimal::new(100, 0),
        credit: Decimal::ZERO,
        distributions: vec![dist],
        errors: Vec::new(),
    }
}

#[test]
fn csv_report_one_row_per_unit() {
    let mut out = Vec::new();
    Csv::write(&mut out, &report()).expect("write csv");

    let text = String::from_utf8(out).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("emission_id,unit_id,principal,interest,total_due,paid,status")
    );
    assert_eq!(
        lines.next(),
        Some("em-1,u-01,50111.01,771.67,50882.68,100,partial")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn csv_bundle_read_is_unsupported() {
    let err = Csv::read(Cursor::new(b"anything".to_vec())).expect_err("no csv input");
    assert!(matches!(err, DomioError::Unsupported(_)));
}

#[test]
fn json_report_is_valid_json() {
    let mut out = Vec::new();
    Json::write(&mut out, &report()).expect("write json");
    let value: serde_json::Value = serde_json::from_slice(&out).expect("parse back");
    assert_eq!(value["emission_id"], "em-1");
    assert_eq!(value["distributions"][0]["unit_id"], "u-01");
}
