use domiolib::{
    formats::{csv::Csv, json::Json},
    settle::settle,
    traits::{ReadFormat, WriteFormat},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: пакет эмиссии (JSON, stdin) -> отчёт на сегодня (CSV, stdout)
    let bundle = Json::read(std::io::BufReader::new(std::io::stdin()))?;
    let report = settle(&bundle, chrono::Local::now().date_naive())?;
    Csv::write(std::io::stdout(), &report)?;
    Ok(())
}
