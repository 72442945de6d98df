use chrono::NaiveDate;
use domiolib::error::DomioError;
use domiolib::model::{
    AllocationBucket, Emission, EmissionStatus, EmissionType, Payment, PaymentAllocation,
    PaymentMethod, PaymentStatus, UnitDistribution, UnitStatus,
};
use domiolib::reconcile::apply;
use rust_decimal::Decimal;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn emission(id: &str, due: NaiveDate) -> Emission {
    Emission {
        id: id.into(),
        community_id: "cm-1".into(),
        period: "2024-01".into(),
        kind: EmissionType::Ordinary,
        issue_date: None,
        due_date: due,
        grace_days: 0,
        interest_rate: None,
        compound_interest: false,
        currency: "EUR".into(),
        status: EmissionStatus::Sent,
    }
}

fn dist(emission_id: &str, principal: i64, interest: i64) -> UnitDistribution {
    let mut d = UnitDistribution::new("u-01", emission_id);
    d.principal = Decimal::new(principal, 0);
    d.interest = Decimal::new(interest, 0);
    d
}

fn payment(amount: Decimal) -> Payment {
    Payment {
        id: "p-1".into(),
        unit_id: "u-01".into(),
        amount,
        date: date(2024, 3, 1),
        method: PaymentMethod::Transfer,
        reference: Some("REF1".into()),
        status: PaymentStatus::Confirmed,
        allocations: Vec::new(),
    }
}

fn two_emissions() -> (Vec<Emission>, Vec<UnitDistribution>) {
    let emissions = vec![
        emission("em-1", date(2024, 1, 10)),
        emission("em-2", date(2024, 2, 10)),
    ];
    let dists = vec![dist("em-2", 50, 0), dist("em-1", 100, 10)];
    (emissions, dists)
}

#[test]
fn auto_order_oldest_principal_then_interest() {
    let (emissions, dists) = two_emissions();
    let outcome = apply(&payment(Decimal::new(130, 0)), dists, &emissions).expect("apply");

    // em-1 старше: сначала её долг, затем её пеня, остаток — в em-2
    assert_eq!(outcome.applied.len(), 3);
    assert_eq!(outcome.applied[0].emission_id, "em-1");
    assert_eq!(outcome.applied[0].bucket, AllocationBucket::Principal);
    assert_eq!(outcome.applied[0].amount, Decimal::new(100, 0));
    assert_eq!(outcome.applied[1].bucket, AllocationBucket::Interest);
    assert_eq!(outcome.applied[1].amount, Decimal::new(10, 0));
    assert_eq!(outcome.applied[2].emission_id, "em-2");
    assert_eq!(outcome.applied[2].amount, Decimal::new(20, 0));
    assert_eq!(outcome.remainder, Decimal::ZERO);

    let em1 = outcome
        .distributions
        .iter()
        .find(|d| d.emission_id == "em-1")
        .expect("em-1");
    assert_eq!(em1.status, UnitStatus::Paid);
    let em2 = outcome
        .distributions
        .iter()
        .find(|d| d.emission_id == "em-2")
        .expect("em-2");
    assert_eq!(em2.status, UnitStatus::Partial);
}

#[test]
fn money_is_never_lost() {
    let (emissions, dists) = two_emissions();
    let outcome = apply(&payment(Decimal::new(200, 0)), dists, &emissions).expect("apply");

    let applied: Decimal = outcome.applied.iter().map(|a| a.amount).sum();
    assert_eq!(applied + outcome.remainder, Decimal::new(200, 0));
    // обязательств на 160, аванс 40
    assert_eq!(outcome.remainder, Decimal::new(40, 0));
    assert!(outcome
        .distributions
        .iter()
        .all(|d| d.status == UnitStatus::Paid));
}

#[test]
fn manual_allocation_overrides_auto_order() {
    let (emissions, dists) = two_emissions();
    let mut p = payment(Decimal::new(35, 0));
    p.allocations = vec![
        PaymentAllocation {
            emission_id: "em-2".into(),
            bucket: AllocationBucket::Principal,
            amount: Decimal::new(30, 0),
        },
        PaymentAllocation {
            emission_id: "em-1".into(),
            bucket: AllocationBucket::Interest,
            amount: Decimal::new(5, 0),
        },
    ];

    let outcome = apply(&p, dists, &emissions).expect("apply");
    let em1 = outcome
        .distributions
        .iter()
        .find(|d| d.emission_id == "em-1")
        .expect("em-1");
    // долг em-1 не тронут, оплачена только пеня
    assert_eq!(em1.paid_principal, Decimal::ZERO);
    assert_eq!(em1.paid_interest, Decimal::new(5, 0));

    let em2 = outcome
        .distributions
        .iter()
        .find(|d| d.emission_id == "em-2")
        .expect("em-2");
    assert_eq!(em2.paid_principal, Decimal::new(30, 0));
    assert_eq!(outcome.remainder, Decimal::ZERO);
}

#[test]
fn manual_allocation_must_sum_to_payment_amount() {
    let (emissions, dists) = two_emissions();
    let mut p = payment(Decimal::new(100, 0));
    p.allocations = vec![PaymentAllocation {
        emission_id: "em-1".into(),
        bucket: AllocationBucket::Principal,
        amount: Decimal::new(99, 0),
    }];

    let err = apply(&p, dists, &emissions).expect_err("sum mismatch");
    assert!(matches!(err, DomioError::AllocationMismatch(_)));
}

#[test]
fn manual_allocation_to_unknown_emission_is_rejected() {
    let (emissions, dists) = two_emissions();
    let mut p = payment(Decimal::new(10, 0));
    p.allocations = vec![PaymentAllocation {
        emission_id: "em-99".into(),
        bucket: AllocationBucket::Principal,
        amount: Decimal::new(10, 0),
    }];

    let err = apply(&p, dists, &emissions).expect_err("unknown emission");
    assert!(matches!(err, DomioError::Validation(_)));
}

#[test]
fn non_confirmed_payment_is_an_error_not_a_noop() {
    let (emissions, dists) = two_emissions();

    let mut pending = payment(Decimal::new(10, 0));
    pending.status = PaymentStatus::Pending;
    let err = apply(&pending, dists.clone(), &emissions).expect_err("pending");
    assert!(matches!(err, DomioError::NonConfirmedPayment(_)));

    let mut rejected = payment(Decimal::new(10, 0));
    rejected.status = PaymentStatus::Rejected;
    let err = apply(&rejected, dists, &emissions).expect_err("rejected");
    assert!(matches!(err, DomioError::NonConfirmedPayment(_)));
}

#[test]
fn paid_within_rounding_tolerance() {
    let emissions = vec![emission("em-1", date(2024, 1, 10))];
    let dists = vec![dist("em-1", 100, 0)];

    let outcome = apply(
        &payment(Decimal::new(99_99, 2)),
        dists,
        &emissions,
    )
    .expect("apply");
    assert_eq!(outcome.distributions[0].status, UnitStatus::Paid);
}
