//! File exporters for supplier lists.
//!
//! CSV output targets spreadsheet users: UTF-8 with a byte-order mark,
//! Russian column headers, list fields joined with `", "`, and booleans
//! rendered as `Да`/`Нет`. JSON output is the plain serialized record list.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{ExportError, SupplierRecord};

const CSV_FILE_NAME: &str = "suppliers.csv";
const JSON_FILE_NAME: &str = "suppliers.json";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADERS: [&str; 16] = [
    "Название",
    "Ссылка",
    "Фото",
    "Мин цена CNY",
    "Макс цена CNY",
    "MOQ",
    "Компания",
    "Локация",
    "Теги",
    "Завод",
    "Уверенность",
    "Аудит",
    "Сертификаты",
    "Доказательства",
    "Лет на рынке",
    "Скор",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

/// Write `records` to `dir` in the requested format and return the file path.
///
/// The directory is created if needed; an existing export of the same format
/// is overwritten.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the directory or file cannot be written,
/// or a serializer error from the CSV/JSON writer.
pub fn export_records(
    records: &[SupplierRecord],
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let path = match format {
        ExportFormat::Csv => dir.join(CSV_FILE_NAME),
        ExportFormat::Json => dir.join(JSON_FILE_NAME),
    };
    let file = File::create(&path).map_err(|e| io_error(&path, e))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(&mut writer, records, &path)?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
        }
    }
    writer.flush().map_err(|e| io_error(&path, e))?;

    tracing::info!(path = %path.display(), format = %format, count = records.len(), "exported suppliers");
    Ok(path)
}

fn write_csv<W: Write>(
    out: &mut W,
    records: &[SupplierRecord],
    path: &Path,
) -> Result<(), ExportError> {
    out.write_all(UTF8_BOM).map_err(|e| io_error(path, e))?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(csv_row(record))?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}

fn csv_row(r: &SupplierRecord) -> [String; 16] {
    [
        r.title.clone(),
        r.url.clone(),
        r.image_urls.join(", "),
        opt(r.price_min_cny),
        opt(r.price_max_cny),
        opt(r.moq),
        r.shop_name.clone().unwrap_or_default(),
        r.location.clone().unwrap_or_default(),
        r.tags.join(", "),
        yes_no(r.is_factory).to_string(),
        round_to(r.is_factory_confidence, 2).to_string(),
        yes_no(r.audited).to_string(),
        r.certifications.join(", "),
        r.evidence.join(", "),
        opt(r.years_active),
        round_to(r.score, 1).to_string(),
    ]
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Да"
    } else {
        "Нет"
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}
