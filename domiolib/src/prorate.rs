//! Распределение статей расходов по помещениям.
//!
//! Весь расчёт ведётся в минорных единицах: сырые доли считаются в полной
//! точности `Decimal`, затем округляются вниз, а остаток раздаётся по одной
//! копейке помещениям с наибольшей дробной частью (при равенстве — по
//! возрастанию идентификатора). Сумма долей всегда сходится с суммой статьи
//! копейка в копейку.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DomioError, Result};
use crate::model::{
    from_cents, to_cents, Concept, ConceptAmount, DistributionRule, Emission, UnitDistribution,
    UnitParticipation,
};
use crate::traits::TariffLookup;

/// Сумма статьи: фиксированная либо рассчитанная по тарифу (с налогом).
pub fn concept_amount<T: TariffLookup + ?Sized>(
    concept: &Concept,
    tariffs: &T,
    billing_date: NaiveDate,
) -> Result<Decimal> {
    match &concept.amount {
        ConceptAmount::Fixed { amount } => Ok(*amount),
        ConceptAmount::Metered { quantity, service } => {
            let tariff = tariffs.tariff_for(*service, billing_date).ok_or_else(|| {
                DomioError::CoverageGap(format!(
                    "no {service:?} tariff in effect on {billing_date}"
                ))
            })?;
            tariff.validate()?;
            let raw = tariff.resolve(*quantity, billing_date)?;
            Ok(tariff.apply_tax(raw))
        }
    }
}

/// Распределение всех статей эмиссии по активному реестру
/// (до пени и до платежей).
pub fn distribute<T: TariffLookup + ?Sized>(
    emission: &Emission,
    concepts: &[Concept],
    roster: &[UnitParticipation],
    tariffs: &T,
) -> Result<Vec<UnitDistribution>> {
    let mut active: BTreeMap<&str, &UnitParticipation> = BTreeMap::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for unit in roster {
        if !seen.insert(unit.unit_id.as_str()) {
            return Err(DomioError::Validation(format!(
                "duplicate unit {} in roster",
                unit.unit_id
            )));
        }
        if unit.quota < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "negative quota {} for unit {}",
                unit.quota, unit.unit_id
            )));
        }
        if unit.active {
            active.insert(unit.unit_id.as_str(), unit);
        }
    }

    // дата, на которую оцениваются статьи по счётчикам
    let billing_date = emission.issue_date.unwrap_or(emission.due_date);

    let mut totals: BTreeMap<&str, i64> = active.keys().map(|id| (*id, 0i64)).collect();

    for concept in concepts {
        let amount = concept_amount(concept, tariffs, billing_date)?;
        if amount < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "concept {} has negative amount {amount}",
                concept.id
            )));
        }
        let cents = to_cents(amount)?;

        match &concept.rule {
            DistributionRule::Equal => {
                let weights: Vec<(&str, Decimal)> =
                    active.keys().map(|id| (*id, Decimal::ONE)).collect();
                add_weighted(&mut totals, cents, &weights, &concept.id)?;
            }
            DistributionRule::Proportional => {
                let weights: Vec<(&str, Decimal)> =
                    active.values().map(|u| (u.unit_id.as_str(), u.quota)).collect();
                add_weighted(&mut totals, cents, &weights, &concept.id)?;
            }
            DistributionRule::Custom { shares } => {
                for id in active.keys() {
                    if !shares.contains_key(*id) {
                        return Err(DomioError::Validation(format!(
                            "concept {}: custom shares miss active unit {id}",
                            concept.id
                        )));
                    }
                }
                let mut sum = 0i64;
                for (id, share) in shares {
                    if !active.contains_key(id.as_str()) {
                        return Err(DomioError::Validation(format!(
                            "concept {}: custom share for unknown or inactive unit {id}",
                            concept.id
                        )));
                    }
                    if *share < Decimal::ZERO {
                        return Err(DomioError::Validation(format!(
                            "concept {}: negative share {share} for unit {id}",
                            concept.id
                        )));
                    }
                    sum += to_cents(*share)?;
                }
                if sum != cents {
                    return Err(DomioError::AllocationMismatch(format!(
                        "concept {}: custom shares sum to {}, amount is {}",
                        concept.id,
                        from_cents(sum),
                        from_cents(cents)
                    )));
                }
                for (id, share) in shares {
                    if let Some(total) = totals.get_mut(id.as_str()) {
                        *total += to_cents(*share)?;
                    }
                }
            }
        }
    }

    Ok(totals
        .into_iter()
        .map(|(id, cents)| {
            let mut dist = UnitDistribution::new(id, &emission.id);
            dist.principal = from_cents(cents);
            dist
        })
        .collect())
}

/// Метод наибольших остатков: доли вниз до копейки, остаток — по одной
/// копейке в порядке убывания дробной части, при равенстве — по
/// возрастанию идентификатора.
fn add_weighted(
    totals: &mut BTreeMap<&str, i64>,
    cents: i64,
    weights: &[(&str, Decimal)],
    concept_id: &str,
) -> Result<()> {
    if weights.is_empty() {
        return Err(DomioError::Validation(format!(
            "concept {concept_id}: no active units to distribute over"
        )));
    }
    let weight_sum: Decimal = weights.iter().map(|(_, w)| *w).sum();
    if weight_sum <= Decimal::ZERO {
        return Err(DomioError::Validation(format!(
            "concept {concept_id}: active quotas sum to zero"
        )));
    }

    let amount = Decimal::from(cents);
    let mut floors: Vec<(&str, i64)> = Vec::with_capacity(weights.len());
    let mut fracs: Vec<(Decimal, usize)> = Vec::with_capacity(weights.len());
    let mut assigned = 0i64;
    for (i, (id, weight)) in weights.iter().enumerate() {
        let raw = amount * weight / weight_sum;
        let floor = raw.floor();
        let floor_cents = floor.to_i64().ok_or_else(|| {
            DomioError::Validation(format!("concept {concept_id}: share out of range"))
        })?;
        assigned += floor_cents;
        floors.push((id, floor_cents));
        fracs.push((raw - floor, i));
    }

    // `weights` идёт по возрастанию идентификатора, стабильная сортировка
    // сохраняет этот порядок при равных дробных частях
    fracs.sort_by(|a, b| b.0.cmp(&a.0));
    let mut leftover = cents - assigned;
    for (_, i) in &fracs {
        if leftover == 0 {
            break;
        }
        floors[*i].1 += 1;
        leftover -= 1;
    }

    for (id, share) in floors {
        if let Some(total) = totals.get_mut(id) {
            *total += share;
        }
    }
    Ok(())
}
