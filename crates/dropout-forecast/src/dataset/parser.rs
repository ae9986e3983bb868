use super::raw::{parse_numeric, RawCell, RawRecord};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::warn;

/// Records that survived key parsing, plus how many rows were dropped.
#[derive(Debug, Default)]
pub(crate) struct ParsedRows {
    pub(crate) records: Vec<RawRecord>,
    pub(crate) skipped: usize,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<ParsedRows, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut parsed = ParsedRows::default();

    for (index, row) in csv_reader.deserialize::<MunicipalRow>().enumerate() {
        let row = row?;
        match row.into_record() {
            Some(record) => parsed.records.push(record),
            None => {
                // +2: header line and 1-based numbering
                warn!(line = index + 2, "skipping row without numeric municipality, department or year");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct MunicipalRow {
    #[serde(rename = "CÓDIGO_MUNICIPIO", alias = "entity_id")]
    entity_id: String,
    #[serde(rename = "MUNICIPIO", alias = "entity_name")]
    entity_name: String,
    #[serde(rename = "CÓDIGO_DEPARTAMENTO", alias = "department_id")]
    department_id: String,
    #[serde(rename = "AÑO", alias = "year")]
    year: String,
    #[serde(
        rename = "COBERTURA_BRUTA",
        alias = "gross_coverage",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    gross_coverage: Option<String>,
    #[serde(
        rename = "COBERTURA_NETA",
        alias = "net_coverage",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    net_coverage: Option<String>,
    #[serde(
        rename = "DESERCIÓN",
        alias = "dropout_rate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    dropout_rate: Option<String>,
    #[serde(
        rename = "REPITENCIA",
        alias = "repetition_rate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    repetition_rate: Option<String>,
    #[serde(
        rename = "TAMAÑO_PROMEDIO_DE_GRUPO",
        alias = "avg_class_size",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    avg_class_size: Option<String>,
    #[serde(
        rename = "COBERTURA_NETA_PRIMARIA",
        alias = "net_coverage_primary",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    net_coverage_primary: Option<String>,
    #[serde(
        rename = "COBERTURA_NETA_MEDIA",
        alias = "net_coverage_secondary",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    net_coverage_secondary: Option<String>,
    #[serde(
        rename = "POBLACIÓN_5_16",
        alias = "population_5_16",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    population_5_16: Option<String>,
    #[serde(rename = "is_capital", default)]
    is_capital: Option<String>,
}

impl MunicipalRow {
    fn into_record(self) -> Option<RawRecord> {
        let entity_id = parse_key(&self.entity_id)?;
        let department_id = parse_key(&self.department_id)?;
        let year = i32::try_from(parse_key(&self.year)?).ok()?;

        Some(RawRecord {
            entity_id,
            entity_name: self.entity_name,
            department_id,
            year,
            gross_coverage: cell(self.gross_coverage),
            net_coverage: cell(self.net_coverage),
            dropout_rate: cell(self.dropout_rate),
            repetition_rate: cell(self.repetition_rate),
            avg_class_size: cell(self.avg_class_size),
            net_coverage_primary: cell(self.net_coverage_primary),
            net_coverage_secondary: cell(self.net_coverage_secondary),
            population_5_16: cell(self.population_5_16),
            is_capital: self.is_capital,
        })
    }
}

fn cell(value: Option<String>) -> RawCell {
    value.map_or(RawCell::Missing, RawCell::Text)
}

/// Integral identifiers; exports sometimes write them as `76.0`.
fn parse_key(value: &str) -> Option<i64> {
    let number = parse_numeric(value)?;
    if number.fract() != 0.0 || !number.is_finite() {
        return None;
    }
    Some(number as i64)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
pub(crate) fn parse_key_for_tests(value: &str) -> Option<i64> {
    parse_key(value)
}
