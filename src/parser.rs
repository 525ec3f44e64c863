// 🏗️ Catalog Parser - raw rows → normalized cats
//
// The spreadsheet export is messy: headers vary in case ("Name" vs "name"),
// ids come through as numbers or text, empty cells mean "none", and "X" is a
// placeholder for "no traits". Everything is normalized here so the core
// only ever sees well-formed `Cat` records.
//
// Loading fails closed: if nothing usable comes out, the game still starts
// with a single-entry catalog.

use crate::entities::{AnswerRef, Cat, CatRegistry, Form};
use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Longest accepted text field
pub const MAX_FIELD_LENGTH: usize = 100;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogSource {
    Csv,
    Json,
}

impl CatalogSource {
    pub fn name(&self) -> &str {
        match self {
            CatalogSource::Csv => "CSV",
            CatalogSource::Json => "JSON",
        }
    }
}

/// One catalog row as exported, before normalization
///
/// Cells are kept as loose JSON values so numeric ids and text ids both load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCatRecord {
    #[serde(alias = "UID", alias = "Unit ID", alias = "unitId")]
    pub unit_id: Option<Value>,

    #[serde(alias = "Name")]
    pub name: Option<Value>,

    #[serde(alias = "Image", alias = "image")]
    pub img: Option<Value>,

    #[serde(alias = "Rarity")]
    pub rarity: Option<Value>,

    #[serde(alias = "Form")]
    pub form: Option<Value>,

    #[serde(alias = "Role")]
    pub role: Option<Value>,

    #[serde(alias = "Traits")]
    pub traits: Option<Value>,

    #[serde(alias = "Attack Type", alias = "attack type", alias = "attackType")]
    pub attack_type: Option<Value>,

    #[serde(alias = "Abilities")]
    pub abilities: Option<Value>,

    #[serde(alias = "Cost")]
    pub cost: Option<Value>,

    #[serde(alias = "Version")]
    pub version: Option<Value>,

    #[serde(alias = "Source")]
    pub source: Option<Value>,
}

// ============================================================================
// CATALOG PARSER
// ============================================================================

pub trait CatalogParser: Send + Sync {
    /// Read raw rows from a reader
    fn parse_reader(&self, reader: Box<dyn Read>) -> Result<Vec<RawCatRecord>>;

    fn source(&self) -> CatalogSource;

    fn parse(&self, file_path: &Path) -> Result<Vec<RawCatRecord>> {
        let file = File::open(file_path)?;
        self.parse_reader(Box::new(file))
    }
}

pub struct CsvCatalogParser;

impl CatalogParser for CsvCatalogParser {
    fn parse_reader(&self, reader: Box<dyn Read>) -> Result<Vec<RawCatRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (line_num, result) in rdr.deserialize::<RawCatRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    // +2: 1-indexed plus header row
                    tracing::warn!("Skipping catalog line {}: {}", line_num + 2, e);
                }
            }
        }

        Ok(records)
    }

    fn source(&self) -> CatalogSource {
        CatalogSource::Csv
    }
}

pub struct JsonCatalogParser;

impl CatalogParser for JsonCatalogParser {
    fn parse_reader(&self, reader: Box<dyn Read>) -> Result<Vec<RawCatRecord>> {
        let records: Vec<RawCatRecord> = serde_json::from_reader(reader)?;
        Ok(records)
    }

    fn source(&self) -> CatalogSource {
        CatalogSource::Json
    }
}

/// Pick a source type from the file extension
pub fn detect_source(file_path: &Path) -> Result<CatalogSource> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(CatalogSource::Csv),
        "json" => Ok(CatalogSource::Json),
        _ => Err(GameError::catalog(format!(
            "Unsupported catalog format: {}",
            file_path.display()
        ))),
    }
}

pub fn get_parser(source: CatalogSource) -> Box<dyn CatalogParser> {
    match source {
        CatalogSource::Csv => Box::new(CsvCatalogParser),
        CatalogSource::Json => Box::new(JsonCatalogParser),
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Read and normalize a catalog file, propagating failures
pub fn try_load_catalog(path: &Path) -> Result<CatRegistry> {
    let source = detect_source(path)?;
    let records = get_parser(source).parse(path)?;

    let cats: Vec<Cat> = records.iter().map(normalize_record).collect();
    if cats.is_empty() {
        return Err(GameError::catalog(format!(
            "No cats found in {}",
            path.display()
        )));
    }

    tracing::debug!("Loaded {} cats from {} ({})", cats.len(), path.display(), source.name());
    Ok(CatRegistry::new(cats))
}

/// Read a catalog, falling back to the single-entry catalog on any failure
pub fn load_catalog(path: &Path) -> CatRegistry {
    match try_load_catalog(path) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Error loading cat data from {}: {}", path.display(), e);
            CatRegistry::fallback()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAnswerRow {
    #[serde(alias = "UID", alias = "unitId")]
    unit_id: u32,

    #[serde(default)]
    form: Option<String>,

    #[serde(default)]
    name: Option<String>,
}

/// Read the indexed answer table: one `unit_id,form,name` row per day
pub fn load_answer_table(path: &Path) -> Result<Vec<AnswerRef>> {
    let file = File::open(path)?;
    parse_answer_table(file)
}

pub fn parse_answer_table<R: Read>(reader: R) -> Result<Vec<AnswerRef>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut answers = Vec::new();
    for result in rdr.deserialize::<RawAnswerRow>() {
        let row = result?;

        let form = match row.form.as_deref().filter(|f| !f.is_empty()) {
            Some(label) => match Form::parse(label) {
                Some(form) => Some(form),
                None => {
                    tracing::warn!("Unknown form '{}' in answer table for unit {}", label, row.unit_id);
                    None
                }
            },
            None => None,
        };

        let mut answer = AnswerRef::new(row.unit_id, form);
        if let Some(name) = row.name.filter(|n| !n.is_empty()) {
            answer = answer.with_name(name);
        }
        answers.push(answer);
    }

    Ok(answers)
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Turn one raw row into a well-formed cat, defaulting whatever is missing
pub fn normalize_record(raw: &RawCatRecord) -> Cat {
    let name = text(&raw.name)
        .map(|n| sanitize_input(&n))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let img = match text(&raw.img).map(|i| strip_markup(&i)) {
        Some(img) if img.starts_with("images/") => format!("public/{}", img),
        Some(img) if img.starts_with("data:") || img.starts_with("public/") => img,
        _ => default_image_path(&name),
    };

    let form = match field(&raw.form) {
        Some(label) => match Form::parse(&label) {
            Some(form) => form,
            None => {
                tracing::warn!("Unknown form '{}' for {}, using Base", label, name);
                Form::Base
            }
        },
        None => Form::Base,
    };

    Cat {
        unit_id: parse_unit_id(&raw.unit_id),
        img,
        rarity: field(&raw.rarity).unwrap_or_else(|| "Normal".to_string()),
        form: form.to_string(),
        role: field(&raw.role).unwrap_or_default(),
        traits: parse_list_field(field(&raw.traits)),
        attack_type: parse_list_field(field(&raw.attack_type)),
        abilities: parse_list_field(field(&raw.abilities)),
        cost: format_cost(field(&raw.cost).as_deref()),
        version: format_version(field(&raw.version).as_deref()),
        source: field(&raw.source).unwrap_or_else(|| "Unknown".to_string()),
        name,
    }
}

/// Cap length, drop `<`, `>` and `"`, trim
///
/// Example: `  <b>Cat</b>  ` → `bCat/b`
pub fn sanitize_input(input: &str) -> String {
    let capped: String = input.chars().take(MAX_FIELD_LENGTH).collect();
    strip_markup(&capped)
}

fn strip_markup(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Image path derived from the name
///
/// Example: "Crazed Cat" → "public/images/cats/CrazedCat.webp"
pub fn default_image_path(name: &str) -> String {
    let file_name: String = name
        .replace("Idi:N", "Idi-N")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let file_name = if file_name.is_empty() {
        "unknown".to_string()
    } else {
        file_name
    };
    format!("public/images/cats/{}.webp", file_name)
}

/// Digits only, suffixed with ¢
///
/// Example: "1,500" → "1500¢", "" → "0¢"
pub fn format_cost(value: Option<&str>) -> String {
    let digits: String = value
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        "0¢".to_string()
    } else {
        format!("{}¢", digits)
    }
}

/// Ensure a leading V
///
/// Example: "12.1" → "V12.1", "" → "V1.0"
pub fn format_version(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => "V1.0".to_string(),
        Some(v) if v.starts_with('V') => v.to_string(),
        Some(v) => format!("V{}", v),
    }
}

/// Empty and "X" placeholders mean "none"
fn parse_list_field(value: Option<String>) -> String {
    match value {
        Some(v) if v.eq_ignore_ascii_case("x") => String::new(),
        Some(v) => v.trim().to_string(),
        None => String::new(),
    }
}

fn parse_unit_id(value: &Option<Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u32))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Loose cell → text, None for null/empty
fn text(value: &Option<Value>) -> Option<String> {
    let text = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Sanitized, non-empty text cell
fn field(value: &Option<Value>) -> Option<String> {
    text(value).map(|t| sanitize_input(&t)).filter(|t| !t.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
