//! Доменные модели — единый «нормализованный» слой между расчётами и форматами.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DomioError, Result};
use crate::tariff::TariffDefinition;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceType {
    Electricity,
    Water,
    Gas,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmissionType {
    Ordinary,
    Extraordinary,
    Fine,
    Interest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmissionStatus {
    Draft,
    Ready,
    Sent,
    Partial,
    Overdue,
    Paid,
    Cancelled,
}

/// Одна эмиссия: выпуск начислений по сообществу за период.
/// `total`/`paid` не хранятся — всегда пересчитываются из статей и платежей.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Emission {
    pub id: String,
    pub community_id: String,
    pub period: String,
    pub kind: EmissionType,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub grace_days: u32,
    /// Ставка пени, % в месяц.
    pub interest_rate: Option<Decimal>,
    #[serde(default)]
    pub compound_interest: bool,
    pub currency: String,
    pub status: EmissionStatus,
}

/// Источник суммы статьи: либо фиксированная сумма, либо расход по счётчику.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConceptAmount {
    Fixed { amount: Decimal },
    Metered { quantity: Decimal, service: ServiceType },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DistributionRule {
    Proportional,
    Equal,
    Custom { shares: BTreeMap<String, Decimal> },
}

/// Статья расходов внутри эмиссии (уборка, электричество мест общего пользования...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concept {
    pub id: String,
    pub emission_id: String,
    pub name: String,
    pub category: String,
    pub amount: ConceptAmount,
    pub rule: DistributionRule,
}

/// Доля помещения в сообществе за период. Квоты не обязаны давать в сумме 1 —
/// при распределении они нормируются на сумму квот активных помещений.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitParticipation {
    pub unit_id: String,
    pub quota: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnitStatus {
    Pending,
    Partial,
    Paid,
}

/// Рассчитанная доля одного помещения в одной эмиссии. Производная запись:
/// выводится из статей, квот и платежей, руками не правится.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitDistribution {
    pub unit_id: String,
    pub emission_id: String,
    pub principal: Decimal,
    pub interest: Decimal,
    pub paid_principal: Decimal,
    pub paid_interest: Decimal,
    pub status: UnitStatus,
}

impl UnitDistribution {
    pub fn new(unit_id: &str, emission_id: &str) -> Self {
        UnitDistribution {
            unit_id: unit_id.to_string(),
            emission_id: emission_id.to_string(),
            principal: Decimal::ZERO,
            interest: Decimal::ZERO,
            paid_principal: Decimal::ZERO,
            paid_interest: Decimal::ZERO,
            status: UnitStatus::Pending,
        }
    }

    pub fn total_due(&self) -> Decimal {
        self.principal + self.interest
    }

    pub fn paid_total(&self) -> Decimal {
        self.paid_principal + self.paid_interest
    }

    pub fn outstanding_principal(&self) -> Decimal {
        (self.principal - self.paid_principal).max(Decimal::ZERO)
    }

    pub fn outstanding_interest(&self) -> Decimal {
        (self.interest - self.paid_interest).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Transfer,
    Card,
    Cash,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Confirmed,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AllocationBucket {
    Principal,
    Interest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentAllocation {
    pub emission_id: String,
    pub bucket: AllocationBucket,
    pub amount: Decimal,
}

/// Платёж помещения. Учитываются только подтверждённые; разбивка по эмиссиям
/// либо задана явно, либо строится автоматически при разнесении.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub unit_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocations: Vec<PaymentAllocation>,
}

/// Полный входной срез для расчёта одной эмиссии.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmissionBundle {
    pub emission: Emission,
    pub concepts: Vec<Concept>,
    pub roster: Vec<UnitParticipation>,
    pub tariffs: Vec<TariffDefinition>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordError {
    pub record_id: String,
    pub message: String,
}

/// Итог расчёта эмиссии: статус, суммы, распределения и ошибки по записям,
/// которые не удалось обработать.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementReport {
    pub emission_id: String,
    pub status: EmissionStatus,
    pub total: Decimal,
    pub paid: Decimal,
    /// Аванс: остаток платежей сверх всех известных обязательств.
    pub credit: Decimal,
    pub distributions: Vec<UnitDistribution>,
    pub errors: Vec<RecordError>,
}

/// Сумма в минорных единицах (копейки/центы). Суммы с долями копейки — ошибка входа.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    let scaled = amount * Decimal::ONE_HUNDRED;
    if !scaled.fract().is_zero() {
        return Err(DomioError::Validation(format!(
            "amount {amount} has sub-cent precision"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| DomioError::Validation(format!("amount {amount} out of range")))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Округление денежной величины до минорных единиц (половина — от нуля).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Допуск в одну минорную единицу при сравнении «оплачено/начислено».
pub fn paid_in_full(due: Decimal, paid: Decimal) -> bool {
    due - paid <= Decimal::new(1, 2)
}
