//! Пеня за просрочку.
//!
//! Начисляется на непогашенный остаток помесячно, по годовщинам крайнего
//! срока (срок оплаты + льготные дни). Расчёт чистый и идемпотентный:
//! повторный вызов на ту же дату даёт тот же итог, а не удвоенный.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{
    round_money, AllocationBucket, Emission, Payment, PaymentStatus, UnitDistribution,
};

/// Крайний срок оплаты с учётом льготных дней.
pub fn grace_deadline(emission: &Emission) -> NaiveDate {
    emission
        .due_date
        .checked_add_days(Days::new(u64::from(emission.grace_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Пеня помещения по эмиссии на дату `evaluation`.
///
/// База каждого месяца — остаток долга на годовщину: подтверждённые платежи
/// в счёт долга, датированные строго раньше годовщины, уменьшают базу всех
/// последующих месяцев. По умолчанию проценты простые; при флаге эмиссии
/// к базе добавляется накопленная и не оплаченная пеня.
pub fn accrue(
    emission: &Emission,
    dist: &UnitDistribution,
    payments: &[Payment],
    evaluation: NaiveDate,
) -> Result<Decimal> {
    let rate = match emission.interest_rate {
        Some(rate) => rate,
        None => return Ok(Decimal::ZERO),
    };
    let deadline = grace_deadline(emission);
    if evaluation <= deadline {
        return Ok(Decimal::ZERO);
    }

    let monthly = rate / Decimal::ONE_HUNDRED;
    let mut accrued = Decimal::ZERO;
    let mut k = 1u32;
    loop {
        let anniversary = match deadline.checked_add_months(Months::new(k)) {
            Some(date) => date,
            None => break,
        };
        if anniversary > evaluation {
            break;
        }

        let paid_principal = paid_in_bucket(
            payments,
            &emission.id,
            &dist.unit_id,
            AllocationBucket::Principal,
            anniversary,
        );
        let mut base = (dist.principal - paid_principal).max(Decimal::ZERO);
        if emission.compound_interest {
            let paid_interest = paid_in_bucket(
                payments,
                &emission.id,
                &dist.unit_id,
                AllocationBucket::Interest,
                anniversary,
            );
            base += (accrued - paid_interest).max(Decimal::ZERO);
        }
        if base > Decimal::ZERO {
            accrued += round_money(base * monthly);
        }
        k += 1;
    }
    Ok(accrued)
}

/// Подтверждённые платежи помещения в заданную корзину эмиссии,
/// датированные строго раньше `before`.
fn paid_in_bucket(
    payments: &[Payment],
    emission_id: &str,
    unit_id: &str,
    bucket: AllocationBucket,
    before: NaiveDate,
) -> Decimal {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Confirmed && p.unit_id == unit_id && p.date < before)
        .flat_map(|p| &p.allocations)
        .filter(|a| a.emission_id == emission_id && a.bucket == bucket)
        .map(|a| a.amount)
        .sum()
}
