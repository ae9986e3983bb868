/// One cell of a metric column as it arrived from the source export.
///
/// Exports mix real numbers with text such as `"12,5%"`; the cell keeps the
/// original shape so that coercion happens in one place during feature
/// preparation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawCell {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Numeric value of the cell; unparsable text and non-finite numbers
    /// degrade to `None`.
    pub fn coerce(&self) -> Option<f64> {
        match self {
            RawCell::Missing => None,
            RawCell::Number(value) => value.is_finite().then_some(*value),
            RawCell::Text(text) => parse_numeric(text),
        }
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<Option<f64>> for RawCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawCell::Missing, RawCell::Number)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

/// Strips `%`, swaps a comma decimal separator for a dot and parses.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned = text.replace('%', "").replace(',', ".");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Affirmative tokens accepted in the capital column, compared lower-cased.
const CAPITAL_TOKENS: [&str; 5] = ["yes", "si", "sí", "true", "1"];

pub fn is_affirmative(token: &str) -> bool {
    let lowered = token.trim().to_lowercase();
    CAPITAL_TOKENS.contains(&lowered.as_str())
}

/// One municipality-year observation before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub entity_id: i64,
    pub entity_name: String,
    pub department_id: i64,
    pub year: i32,
    pub gross_coverage: RawCell,
    pub net_coverage: RawCell,
    pub dropout_rate: RawCell,
    pub repetition_rate: RawCell,
    pub avg_class_size: RawCell,
    pub net_coverage_primary: RawCell,
    pub net_coverage_secondary: RawCell,
    pub population_5_16: RawCell,
    /// `None` when the export has no capital column at all.
    pub is_capital: Option<String>,
}

impl RawRecord {
    pub fn new(entity_id: i64, entity_name: impl Into<String>, department_id: i64, year: i32) -> Self {
        Self {
            entity_id,
            entity_name: entity_name.into(),
            department_id,
            year,
            gross_coverage: RawCell::Missing,
            net_coverage: RawCell::Missing,
            dropout_rate: RawCell::Missing,
            repetition_rate: RawCell::Missing,
            avg_class_size: RawCell::Missing,
            net_coverage_primary: RawCell::Missing,
            net_coverage_secondary: RawCell::Missing,
            population_5_16: RawCell::Missing,
            is_capital: None,
        }
    }
}
