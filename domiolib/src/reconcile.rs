//! Разнесение платежей по обязательствам помещения.
//!
//! Автоматический порядок: эмиссии от старых к новым по сроку оплаты,
//! внутри эмиссии сначала долг, затем пеня. Явная разбивка платежа имеет
//! приоритет над автоматическим порядком. Неразнесённый остаток
//! возвращается как аванс и никогда не теряется:
//! `остаток + сумма разнесённого == сумма платежа`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{DomioError, Result};
use crate::model::{
    paid_in_full, AllocationBucket, Emission, Payment, PaymentAllocation, PaymentStatus,
    UnitDistribution, UnitStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub distributions: Vec<UnitDistribution>,
    /// Фактическая разбивка платежа, в порядке применения.
    pub applied: Vec<PaymentAllocation>,
    pub remainder: Decimal,
}

/// Статус помещения по текущим суммам.
pub fn derive_unit_status(dist: &UnitDistribution) -> UnitStatus {
    let due = dist.total_due();
    let paid = dist.paid_total();
    if paid > Decimal::ZERO && paid_in_full(due, paid) {
        UnitStatus::Paid
    } else if paid > Decimal::ZERO {
        UnitStatus::Partial
    } else if due.is_zero() {
        UnitStatus::Paid
    } else {
        UnitStatus::Pending
    }
}

/// Применяет один подтверждённый платёж к распределениям его помещения.
/// Неподтверждённый платёж — ошибка, а не тихий no-op.
pub fn apply(
    payment: &Payment,
    distributions: Vec<UnitDistribution>,
    emissions: &[Emission],
) -> Result<ReconcileOutcome> {
    if payment.status != PaymentStatus::Confirmed {
        return Err(DomioError::NonConfirmedPayment(format!(
            "payment {} is {:?}",
            payment.id, payment.status
        )));
    }
    if payment.amount < Decimal::ZERO {
        return Err(DomioError::Validation(format!(
            "payment {} has negative amount {}",
            payment.id, payment.amount
        )));
    }

    let mut dists = distributions;
    let mut applied: Vec<PaymentAllocation> = Vec::new();
    let remainder = if payment.allocations.is_empty() {
        apply_auto(payment, &mut dists, emissions, &mut applied)
    } else {
        apply_manual(payment, &mut dists, &mut applied)?
    };

    for dist in dists.iter_mut().filter(|d| d.unit_id == payment.unit_id) {
        dist.status = derive_unit_status(dist);
    }

    Ok(ReconcileOutcome {
        distributions: dists,
        applied,
        remainder,
    })
}

/// Явная разбивка: проверяется сумма, применяется как задано; превышение
/// остатка корзины уходит в аванс.
fn apply_manual(
    payment: &Payment,
    dists: &mut [UnitDistribution],
    applied: &mut Vec<PaymentAllocation>,
) -> Result<Decimal> {
    let sum: Decimal = payment.allocations.iter().map(|a| a.amount).sum();
    if sum != payment.amount {
        return Err(DomioError::AllocationMismatch(format!(
            "payment {}: allocations sum to {sum}, amount is {}",
            payment.id, payment.amount
        )));
    }

    let mut remainder = Decimal::ZERO;
    for alloc in &payment.allocations {
        if alloc.amount < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "payment {}: negative allocation {}",
                payment.id, alloc.amount
            )));
        }
        let dist = dists
            .iter_mut()
            .find(|d| d.unit_id == payment.unit_id && d.emission_id == alloc.emission_id)
            .ok_or_else(|| {
                DomioError::Validation(format!(
                    "payment {}: allocation refers to unknown emission {}",
                    payment.id, alloc.emission_id
                ))
            })?;
        let taken = match alloc.bucket {
            AllocationBucket::Principal => {
                let take = alloc.amount.min(dist.outstanding_principal());
                dist.paid_principal += take;
                take
            }
            AllocationBucket::Interest => {
                let take = alloc.amount.min(dist.outstanding_interest());
                dist.paid_interest += take;
                take
            }
        };
        if taken > Decimal::ZERO {
            applied.push(PaymentAllocation {
                emission_id: alloc.emission_id.clone(),
                bucket: alloc.bucket,
                amount: taken,
            });
        }
        remainder += alloc.amount - taken;
    }
    Ok(remainder)
}

/// Автоматический порядок: по сроку оплаты эмиссии, затем по её
/// идентификатору; долг раньше пени.
fn apply_auto(
    payment: &Payment,
    dists: &mut [UnitDistribution],
    emissions: &[Emission],
    applied: &mut Vec<PaymentAllocation>,
) -> Decimal {
    let due_date = |emission_id: &str| -> NaiveDate {
        emissions
            .iter()
            .find(|e| e.id == emission_id)
            .map_or(NaiveDate::MAX, |e| e.due_date)
    };

    let mut order: Vec<usize> = (0..dists.len())
        .filter(|&i| dists[i].unit_id == payment.unit_id)
        .collect();
    order.sort_by(|&a, &b| {
        (due_date(&dists[a].emission_id), &dists[a].emission_id)
            .cmp(&(due_date(&dists[b].emission_id), &dists[b].emission_id))
    });

    let mut left = payment.amount;
    for i in order {
        if left.is_zero() {
            break;
        }
        let dist = &mut dists[i];

        let take = left.min(dist.outstanding_principal());
        if take > Decimal::ZERO {
            dist.paid_principal += take;
            left -= take;
            applied.push(PaymentAllocation {
                emission_id: dist.emission_id.clone(),
                bucket: AllocationBucket::Principal,
                amount: take,
            });
        }

        let take = left.min(dist.outstanding_interest());
        if take > Decimal::ZERO {
            dist.paid_interest += take;
            left -= take;
            applied.push(PaymentAllocation {
                emission_id: dist.emission_id.clone(),
                bucket: AllocationBucket::Interest,
                amount: take,
            });
        }
    }
    left
}
