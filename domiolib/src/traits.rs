//! Узкие интерфейсы: форматы ввода/вывода и внешние коллабораторы.

use chrono::NaiveDate;
use std::io::{BufRead, Write};

use crate::error::Result;
use crate::model::{Emission, EmissionBundle, EmissionStatus, ServiceType, SettlementReport, UnitStatus};
use crate::tariff::TariffDefinition;

pub trait ReadFormat {
    fn read<R: BufRead>(r: R) -> Result<EmissionBundle>;
}

pub trait WriteFormat {
    fn write<W: Write>(w: W, report: &SettlementReport) -> Result<()>;
}

/// Подбор версии тарифа: услуга + дата -> действующее определение.
pub trait TariffLookup {
    fn tariff_for(&self, service: ServiceType, date: NaiveDate) -> Option<&TariffDefinition>;
}

/// Для списка тарифов действует версия с окном, содержащим дату;
/// при нескольких подходящих — с самым поздним `valid_from`.
impl TariffLookup for [TariffDefinition] {
    fn tariff_for(&self, service: ServiceType, date: NaiveDate) -> Option<&TariffDefinition> {
        self.iter()
            .filter(|t| t.service == service && t.in_window(date))
            .max_by_key(|t| t.valid_from)
    }
}

/// Коллаборатор уведомлений: вызывается на каждой смене статуса.
pub trait Notifier {
    fn emission_status(&mut self, emission: &Emission, status: EmissionStatus);
    fn unit_status(&mut self, emission: &Emission, unit_id: &str, status: UnitStatus);
}

/// Заглушка для вызывающих, которым уведомления не нужны.
pub struct NoNotify;

impl Notifier for NoNotify {
    fn emission_status(&mut self, _emission: &Emission, _status: EmissionStatus) {}
    fn unit_status(&mut self, _emission: &Emission, _unit_id: &str, _status: UnitStatus) {}
}
