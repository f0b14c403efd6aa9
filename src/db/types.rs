//! Database type definitions
//!
//! Core data structures for representing fetched rows, data types, and values.

use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A single row in column order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Row {
    /// Cell values in column order
    pub values: Vec<CellValue>,
}

impl Row {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { values }
    }

    /// Display text of the cell at `col`, if the row has one
    pub fn text_at(&self, col: usize) -> Option<String> {
        self.values.get(col).map(CellValue::display_text)
    }
}

/// Database data types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    // Integer types
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,
    Numeric,

    // Text types
    Text,
    Varchar,
    Char,

    // Boolean
    Boolean,

    // Date/time types
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,

    // JSON types
    Json,
    Jsonb,

    // Binary data
    Bytea,

    // UUID
    Uuid,

    // Array type
    Array(Box<DataType>),

    // Other/unknown types
    Unknown(String),
}

/// A cell value, tagged with the kind the driver returned
#[derive(Debug, Clone)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// NUMERIC value
    Decimal(Decimal),

    /// Text/string value
    Text(String),

    /// Date/time value (rendered by the driver)
    DateTime(String),

    /// UUID value
    Uuid(String),

    /// JSON value (parsed)
    Json(serde_json::Value),

    /// Binary data
    Binary(Vec<u8>),

    /// Array value
    Array(Vec<CellValue>),
}

impl CellValue {
    /// Full textual form shown in the grid and used as an UPDATE literal
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Decimal(d) => d.to_string(),
            CellValue::Text(s) | CellValue::DateTime(s) | CellValue::Uuid(s) => s.clone(),
            CellValue::Json(v) => v.to_string(),
            CellValue::Binary(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                format!("\\x{}", hex)
            }
            CellValue::Array(arr) => {
                let items: Vec<String> = arr.iter().map(CellValue::display_text).collect();
                format!("{{{}}}", items.join(","))
            }
        }
    }

    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Position of this kind in the cross-kind order. NULL sorts last.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Boolean(_) => 0,
            CellValue::Integer(_) | CellValue::Float(_) | CellValue::Decimal(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::DateTime(_) => 3,
            CellValue::Uuid(_) => 4,
            CellValue::Json(_) => 5,
            CellValue::Binary(_) => 6,
            CellValue::Array(_) => 7,
            CellValue::Null => u8::MAX,
        }
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Decimal(a), Decimal(b)) => a.cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Integer(a), Decimal(b)) => rust_decimal::Decimal::from(*a).cmp(b),
            (Decimal(a), Integer(b)) => a.cmp(&rust_decimal::Decimal::from(*b)),
            (Float(a), Decimal(b)) => compare_float_decimal(*a, b),
            (Decimal(a), Float(b)) => compare_float_decimal(*b, a).reverse(),
            (Text(a), Text(b)) | (DateTime(a), DateTime(b)) | (Uuid(a), Uuid(b)) => a.cmp(b),
            (Json(a), Json(b)) => a.to_string().cmp(&b.to_string()),
            (Binary(a), Binary(b)) => a.cmp(b),
            (Array(a), Array(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn compare_float_decimal(a: f64, b: &Decimal) -> Ordering {
    match Decimal::from_f64_retain(a) {
        Some(a) => a.cmp(b),
        // NaN and values beyond Decimal's range
        None if a.is_nan() || a > 0.0 => Ordering::Greater,
        None => Ordering::Less,
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

/// Sort rows ascending by full-row comparison
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort();
}
