use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use domiolib::{
    error::{DomioError, Result},
    formats::{csv::Csv, json::Json},
    settle::settle,
    traits::{ReadFormat, WriteFormat},
};
use std::fs::File;
use std::io::{self, BufReader, Write};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Fmt {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name="domio", version, about="Расчёт начислений по общим расходам")]
struct Cli {
    /// Входной файл с пакетом эмиссии, JSON (по умолчанию stdin)
    #[arg(short='i', long="input")]
    input: Option<String>,

    /// Выходной файл (по умолчанию stdout)
    #[arg(short='o', long="output")]
    output: Option<String>,

    /// Формат отчёта
    #[arg(long="out-format", value_enum)]
    out_format: Fmt,

    /// Дата расчёта, YYYY-MM-DD
    #[arg(long="at")]
    at: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let at = NaiveDate::parse_from_str(&cli.at, "%Y-%m-%d")
        .map_err(|e| DomioError::Validation(format!("evaluation date: {e}")))?;

    // reader
    let reader: Box<dyn io::Read> = match cli.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let bundle = Json::read(BufReader::new(reader))?;

    let report = settle(&bundle, at)?;

    // writer
    let mut writer: Box<dyn Write> = match cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    match cli.out_format {
        Fmt::Json => Json::write(&mut writer, &report),
        Fmt::Csv => Csv::write(&mut writer, &report),
    }?;

    writer.flush().map_err(DomioError::from)
}
