use chrono::NaiveDate;
use domiolib::formats::json::Json;
use domiolib::model::{
    Concept, ConceptAmount, DistributionRule, Emission, EmissionBundle, EmissionStatus,
    EmissionType, UnitParticipation,
};
use domiolib::traits::ReadFormat;
use rust_decimal::Decimal;
use std::io::Cursor;

#[test]
fn json_bundle_roundtrip() {
    let bundle = EmissionBundle {
        emission: Emission {
            id: "em-1".into(),
            community_id: "cm-1".into(),
            period: "2024-01".into(),
            kind: EmissionType::Ordinary,
            issue_date: None,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            grace_days: 5,
            interest_rate: Some(Decimal::new(2, 0)),
            compound_interest: false,
            currency: "EUR".into(),
            status: EmissionStatus::Draft,
        },
        concepts: vec![Concept {
            id: "c-1".into(),
            emission_id: "em-1".into(),
            name: "cleaning".into(),
            category: "general".into(),
            amount: ConceptAmount::Fixed {
                amount: Decimal::from_str_exact("100.50").unwrap(),
            },
            rule: DistributionRule::Equal,
        }],
        roster: vec![UnitParticipation {
            unit_id: "u-01".into(),
            quota: Decimal::from_str_exact("0.35").unwrap(),
            active: true,
        }],
        tariffs: Vec::new(),
        payments: Vec::new(),
    };

    let encoded = serde_json::to_vec(&bundle).expect("encode bundle");
    let decoded = Json::read(Cursor::new(encoded)).expect("read bundle");
    assert_eq!(decoded, bundle);
    assert_eq!(
        decoded.concepts[0].amount,
        ConceptAmount::Fixed {
            amount: Decimal::from_str_exact("100.50").unwrap()
        }
    );
}
