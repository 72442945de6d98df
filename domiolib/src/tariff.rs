//! Тарифы на коммунальные услуги: fixed / tiered / seasonal.
//!
//! Определение тарифа — сериализуемое значение, проверяемое целиком до
//! использования; после ссылки из отправленной эмиссии оно не правится,
//! а вытесняется новой версией с более поздним `valid_from`.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomioError, Result};
use crate::model::{round_money, ServiceType};

/// Ступень тарифа: полуинтервал `[from, to)` расхода по цене `unit_price`.
/// `to == None` — открытая последняя ступень.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBand {
    pub from: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Decimal>,
    pub unit_price: Decimal,
}

/// Сезон: диапазон месяцев может переходить через границу года
/// (например 12..2 — декабрь, январь, февраль).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub name: String,
    pub from_month: u32,
    pub to_month: u32,
    pub unit_price: Decimal,
}

impl Season {
    pub fn contains_month(&self, month: u32) -> bool {
        if self.from_month <= self.to_month {
            (self.from_month..=self.to_month).contains(&month)
        } else {
            month >= self.from_month || month <= self.to_month
        }
    }

    fn months(&self) -> Vec<u32> {
        if self.from_month <= self.to_month {
            (self.from_month..=self.to_month).collect()
        } else {
            (self.from_month..=12).chain(1..=self.to_month).collect()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TariffKind {
    Fixed { unit_price: Decimal },
    Tiered { bands: Vec<TierBand> },
    Seasonal { seasons: Vec<Season> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TariffDefinition {
    pub service: ServiceType,
    pub kind: TariffKind,
    pub valid_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    pub currency: String,
    /// Ставка налога, % сверх рассчитанной суммы.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
}

impl TariffDefinition {
    /// Проверка определения целиком, до любого использования.
    pub fn validate(&self) -> Result<()> {
        if let Some(to) = self.valid_to {
            if to <= self.valid_from {
                return Err(DomioError::Validation(format!(
                    "validity window {} .. {to} is empty",
                    self.valid_from
                )));
            }
        }
        if let Some(rate) = self.tax_rate {
            if rate < Decimal::ZERO {
                return Err(DomioError::Validation(format!("negative tax rate {rate}")));
            }
        }
        match &self.kind {
            TariffKind::Fixed { unit_price } => {
                if *unit_price < Decimal::ZERO {
                    return Err(DomioError::Validation(format!(
                        "negative unit price {unit_price}"
                    )));
                }
            }
            TariffKind::Tiered { bands } => validate_bands(bands)?,
            TariffKind::Seasonal { seasons } => validate_seasons(seasons)?,
        }
        Ok(())
    }

    pub fn in_window(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_to.is_none_or(|to| date < to)
    }

    /// Стоимость расхода `quantity` на дату `billing_date`, без налога.
    pub fn resolve(&self, quantity: Decimal, billing_date: NaiveDate) -> Result<Decimal> {
        if quantity < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "negative quantity {quantity}"
            )));
        }
        if !self.in_window(billing_date) {
            return Err(DomioError::Validation(format!(
                "billing date {billing_date} outside validity window {} .. {}",
                self.valid_from,
                self.valid_to.map_or("open".to_string(), |d| d.to_string())
            )));
        }
        match &self.kind {
            TariffKind::Fixed { unit_price } => Ok(quantity * unit_price),
            TariffKind::Tiered { bands } => resolve_tiered(bands, quantity),
            TariffKind::Seasonal { seasons } => {
                let month = billing_date.month();
                let season = seasons
                    .iter()
                    .find(|s| s.contains_month(month))
                    .ok_or_else(|| {
                        DomioError::CoverageGap(format!("no season covers month {month}"))
                    })?;
                Ok(quantity * season.unit_price)
            }
        }
    }

    /// Налог сверху, с округлением до минорных единиц; без ставки — без изменений.
    pub fn apply_tax(&self, amount: Decimal) -> Decimal {
        match self.tax_rate {
            Some(rate) => round_money(amount * (Decimal::ONE + rate / Decimal::ONE_HUNDRED)),
            None => amount,
        }
    }
}

/// Ступени: непрерывны от нуля, строго возрастают; открытой может быть
/// только последняя.
fn validate_bands(bands: &[TierBand]) -> Result<()> {
    if bands.is_empty() {
        return Err(DomioError::Validation("tiered tariff has no bands".into()));
    }
    let mut expected_from = Decimal::ZERO;
    for (i, band) in bands.iter().enumerate() {
        if band.unit_price < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "negative unit price {} in band {i}",
                band.unit_price
            )));
        }
        if band.from != expected_from {
            return Err(DomioError::Validation(format!(
                "band {i} starts at {}, expected {expected_from} (gap or overlap)",
                band.from
            )));
        }
        match band.to {
            Some(to) => {
                if to <= band.from {
                    return Err(DomioError::Validation(format!(
                        "band {i} range {} .. {to} is empty",
                        band.from
                    )));
                }
                expected_from = to;
            }
            None => {
                if i != bands.len() - 1 {
                    return Err(DomioError::Validation(format!(
                        "open-ended band {i} is not the last one"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Сезоны: все двенадцать месяцев покрыты ровно один раз, с учётом перехода
/// через границу года.
fn validate_seasons(seasons: &[Season]) -> Result<()> {
    if seasons.is_empty() {
        return Err(DomioError::Validation("seasonal tariff has no seasons".into()));
    }
    let mut cover = [0u32; 12];
    for season in seasons {
        if season.unit_price < Decimal::ZERO {
            return Err(DomioError::Validation(format!(
                "negative unit price {} in season {}",
                season.unit_price, season.name
            )));
        }
        if !(1..=12).contains(&season.from_month) || !(1..=12).contains(&season.to_month) {
            return Err(DomioError::Validation(format!(
                "season {} has month range {} .. {}",
                season.name, season.from_month, season.to_month
            )));
        }
        for m in season.months() {
            cover[(m - 1) as usize] += 1;
        }
    }
    for (i, n) in cover.iter().enumerate() {
        if *n != 1 {
            return Err(DomioError::Validation(format!(
                "month {} covered {n} times, expected exactly once",
                i + 1
            )));
        }
    }
    Ok(())
}

/// Обход ступеней по возрастанию: из каждой берём `min(остаток, ширина)`.
fn resolve_tiered(bands: &[TierBand], quantity: Decimal) -> Result<Decimal> {
    let mut remaining = quantity;
    let mut total = Decimal::ZERO;
    for band in bands {
        let take = match band.to {
            Some(to) => remaining.min(to - band.from),
            None => remaining,
        };
        total += take * band.unit_price;
        remaining -= take;
        if remaining.is_zero() {
            break;
        }
    }
    if !remaining.is_zero() {
        return Err(DomioError::CoverageGap(format!(
            "quantity {quantity} exceeds the last bounded band"
        )));
    }
    Ok(total)
}
