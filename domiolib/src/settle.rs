//! Полный расчёт эмиссии: распределение, пеня, разнесение платежей, статусы.
//!
//! Платежи проигрываются в хронологическом порядке (при равной дате — по
//! идентификатору), пеня пересчитывается на дату каждого платежа, чтобы
//! частичная оплата уменьшала базу последующих месяцев. Платёж, который не
//! удалось применить, попадает в список ошибок отчёта и не прерывает
//! расчёт; применяется каждый платёж целиком либо никак.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{DomioError, Result};
use crate::interest;
use crate::lifecycle;
use crate::model::{Emission, EmissionBundle, Payment, RecordError, SettlementReport, UnitDistribution};
use crate::prorate;
use crate::reconcile;
use crate::traits::{NoNotify, Notifier};

pub fn settle(bundle: &EmissionBundle, evaluation: NaiveDate) -> Result<SettlementReport> {
    settle_with(bundle, evaluation, &mut NoNotify)
}

pub fn settle_with<N: Notifier>(
    bundle: &EmissionBundle,
    evaluation: NaiveDate,
    notifier: &mut N,
) -> Result<SettlementReport> {
    for tariff in &bundle.tariffs {
        tariff.validate()?;
    }

    let mut emission = bundle.emission.clone();
    let mut distributions = prorate::distribute(
        &emission,
        &bundle.concepts,
        &bundle.roster,
        bundle.tariffs.as_slice(),
    )?;

    let mut payments: Vec<&Payment> = bundle.payments.iter().collect();
    payments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut errors: Vec<RecordError> = Vec::new();
    // платежи с фактической разбивкой — история балансов для расчёта пени
    let mut history: Vec<Payment> = Vec::new();
    let mut credit = Decimal::ZERO;
    let emissions = std::slice::from_ref(&bundle.emission);

    for payment in payments {
        accrue_all(&mut distributions, &emission, &history, payment.date)?;
        match reconcile::apply(payment, distributions.clone(), emissions) {
            Ok(outcome) => {
                distributions = outcome.distributions;
                credit += outcome.remainder;
                let mut effective = payment.clone();
                effective.allocations = outcome.applied;
                history.push(effective);
            }
            Err(
                err @ (DomioError::NonConfirmedPayment(_)
                | DomioError::AllocationMismatch(_)
                | DomioError::Validation(_)),
            ) => {
                errors.push(RecordError {
                    record_id: payment.id.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    accrue_all(&mut distributions, &emission, &history, evaluation)?;
    let status = lifecycle::refresh(&mut emission, &mut distributions, evaluation, notifier);

    let total: Decimal = distributions.iter().map(|d| d.principal).sum();
    let paid: Decimal = distributions.iter().map(UnitDistribution::paid_total).sum();

    Ok(SettlementReport {
        emission_id: emission.id,
        status,
        total,
        paid,
        credit,
        distributions,
        errors,
    })
}

fn accrue_all(
    distributions: &mut [UnitDistribution],
    emission: &Emission,
    history: &[Payment],
    at: NaiveDate,
) -> Result<()> {
    for dist in distributions.iter_mut() {
        dist.interest = interest::accrue(emission, dist, history, at)?;
    }
    Ok(())
}
