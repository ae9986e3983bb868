use super::ForecastError;
use crate::dataset::normalize;
use crate::features::{HistoricalTable, Record};
use tracing::debug;

/// Finds a municipality in the historical table from a user-typed name.
///
/// The normalized query is first compared for equality with each row's
/// `search_key`; only when nothing matches does it fall back to substring
/// containment. If several municipalities match, the first one in table order
/// wins.
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver<'a> {
    table: &'a HistoricalTable,
}

impl<'a> EntityResolver<'a> {
    pub fn new(table: &'a HistoricalTable) -> Self {
        Self { table }
    }

    /// Every matched row of the selected municipality, in table order.
    pub fn matching_rows(&self, query: &str) -> Result<Vec<&'a Record>, ForecastError> {
        let key = normalize(query);
        if key.is_empty() {
            return Err(ForecastError::not_found(query));
        }

        let rows = self.table.rows();
        let mut matched: Vec<&'a Record> = rows.iter().filter(|record| record.search_key == key).collect();
        if matched.is_empty() {
            matched = rows
                .iter()
                .filter(|record| record.search_key.contains(&key))
                .collect();
        }

        let first_entity = matched
            .first()
            .map(|record| record.entity_id)
            .ok_or_else(|| ForecastError::not_found(query))?;
        matched.retain(|record| record.entity_id == first_entity);

        debug!(query, entity_id = first_entity, rows = matched.len(), "municipality resolved");
        Ok(matched)
    }

    /// Latest observation of the resolved municipality: the highest year,
    /// ties going to the row that appears last.
    pub fn resolve(&self, query: &str) -> Result<&'a Record, ForecastError> {
        self.matching_rows(query)?
            .into_iter()
            .max_by_key(|record| record.year)
            .ok_or_else(|| ForecastError::not_found(query))
    }
}
