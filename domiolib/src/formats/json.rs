//! JSON-обмен: пакет эмиссии на входе, отчёт о расчёте на выходе.

use crate::error::Result;
use crate::model::{EmissionBundle, SettlementReport};
use crate::traits::{ReadFormat, WriteFormat};
use std::io::{BufRead, Write};

pub struct Json;

impl ReadFormat for Json {
    fn read<R: BufRead>(r: R) -> Result<EmissionBundle> {
        Ok(serde_json::from_reader(r)?)
    }
}

impl WriteFormat for Json {
    fn write<W: Write>(w: W, report: &SettlementReport) -> Result<()> {
        serde_json::to_writer_pretty(w, report)?;
        Ok(())
    }
}
