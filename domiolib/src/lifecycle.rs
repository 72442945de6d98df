//! Жизненный цикл эмиссии.
//!
//! Явные переходы: `draft -> ready -> sent`, отмена из любого
//! нетерминального состояния. Статусы `sent / partial / overdue / paid`
//! не хранятся, а выводятся из распределений и дат; `paid` терминален.
//! Отмена не отменяет подтверждённые платежи — их возврат или
//! перераспределение оформляется отдельной операцией.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{DomioError, Result};
use crate::interest::grace_deadline;
use crate::model::{paid_in_full, Concept, Emission, EmissionStatus, UnitDistribution, UnitParticipation};
use crate::prorate;
use crate::reconcile::derive_unit_status;
use crate::traits::{Notifier, TariffLookup};

/// `draft -> ready`: распределение должно успешно построиться для каждого
/// активного помещения. Возвращает построенные распределения.
pub fn make_ready<T: TariffLookup + ?Sized>(
    emission: &mut Emission,
    concepts: &[Concept],
    roster: &[UnitParticipation],
    tariffs: &T,
) -> Result<Vec<UnitDistribution>> {
    if emission.status != EmissionStatus::Draft {
        return Err(DomioError::Transition(format!(
            "{:?} -> Ready",
            emission.status
        )));
    }
    if !roster.iter().any(|u| u.active) {
        return Err(DomioError::Validation("roster has no active units".into()));
    }
    let distributions = prorate::distribute(emission, concepts, roster, tariffs)?;
    emission.status = EmissionStatus::Ready;
    Ok(distributions)
}

/// `ready -> sent`: необратимая заморозка статей и тарифов; дата выпуска
/// проставляется, если не была задана.
pub fn send(emission: &mut Emission, today: NaiveDate) -> Result<()> {
    if emission.status != EmissionStatus::Ready {
        return Err(DomioError::Transition(format!(
            "{:?} -> Sent",
            emission.status
        )));
    }
    if emission.issue_date.is_none() {
        emission.issue_date = Some(today);
    }
    emission.status = EmissionStatus::Sent;
    Ok(())
}

/// Отмена из любого нетерминального состояния.
pub fn cancel(emission: &mut Emission) -> Result<()> {
    match emission.status {
        EmissionStatus::Paid => Err(DomioError::Transition("Paid is terminal".into())),
        EmissionStatus::Cancelled => Err(DomioError::Transition("already cancelled".into())),
        _ => {
            emission.status = EmissionStatus::Cancelled;
            Ok(())
        }
    }
}

/// Выводимый статус отправленной эмиссии. Приоритет: оплачена, затем
/// частично оплачена, затем просрочена; частично оплаченная просроченная
/// эмиссия читается как `Partial` и никогда не «откатывается» в `Sent`.
pub fn derive_status(
    emission: &Emission,
    distributions: &[UnitDistribution],
    evaluation: NaiveDate,
) -> EmissionStatus {
    match emission.status {
        EmissionStatus::Draft | EmissionStatus::Ready | EmissionStatus::Cancelled => {
            return emission.status;
        }
        _ => {}
    }

    let total: Decimal = distributions.iter().map(UnitDistribution::total_due).sum();
    let paid: Decimal = distributions.iter().map(UnitDistribution::paid_total).sum();

    if paid_in_full(total, paid) {
        EmissionStatus::Paid
    } else if paid > Decimal::ZERO {
        EmissionStatus::Partial
    } else if evaluation > grace_deadline(emission) {
        EmissionStatus::Overdue
    } else {
        EmissionStatus::Sent
    }
}

/// Пересчитывает статусы помещений и эмиссии; о каждой смене сообщает
/// коллаборатору уведомлений. Возвращает итоговый статус эмиссии.
pub fn refresh<N: Notifier>(
    emission: &mut Emission,
    distributions: &mut [UnitDistribution],
    evaluation: NaiveDate,
    notifier: &mut N,
) -> EmissionStatus {
    for dist in distributions.iter_mut() {
        let status = derive_unit_status(dist);
        if status != dist.status {
            dist.status = status;
            notifier.unit_status(emission, &dist.unit_id, status);
        }
    }

    let status = derive_status(emission, distributions, evaluation);
    if status != emission.status {
        emission.status = status;
        notifier.emission_status(emission, status);
    }
    status
}
