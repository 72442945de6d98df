//! Отчёт в CSV: одна строка на помещение. Заголовки:
//! emission_id,unit_id,principal,interest,total_due,paid,status
//!
//! Чтение пакета эмиссии из CSV не поддерживается — входной формат JSON.

use crate::error::{DomioError, Result};
use crate::model::{EmissionBundle, SettlementReport, UnitStatus};
use crate::traits::{ReadFormat, WriteFormat};
use csv::WriterBuilder;
use std::io::{BufRead, Write};

#[derive(serde::Serialize)]
struct CsvRow<'a> {
    emission_id: &'a str,
    unit_id: &'a str,
    principal: String,
    interest: String,
    total_due: String,
    paid: String,
    status: &'a str,
}

pub struct Csv;

impl ReadFormat for Csv {
    fn read<R: BufRead>(_r: R) -> Result<EmissionBundle> {
        Err(DomioError::Unsupported("csv read"))
    }
}

impl WriteFormat for Csv {
    fn write<W: Write>(mut w: W, report: &SettlementReport) -> Result<()> {
        let mut wrt = WriterBuilder::new().from_writer(&mut w);
        for d in &report.distributions {
            let out = CsvRow {
                emission_id: &d.emission_id,
                unit_id: &d.unit_id,
                principal: d.principal.to_string(),
                interest: d.interest.to_string(),
                total_due: d.total_due().to_string(),
                paid: d.paid_total().to_string(),
                status: match d.status {
                    UnitStatus::Pending => "pending",
                    UnitStatus::Partial => "partial",
                    UnitStatus::Paid => "paid",
                },
            };
            wrt.serialize(out)?;
        }
        wrt.flush()?;
        Ok(())
    }
}
