use super::domain::Record;
use std::collections::BTreeMap;

/// Class sizes above this are assumed to be recorded in the wrong unit.
pub const CLASS_SIZE_OUTLIER: f64 = 100.0;
pub const CLASS_SIZE_RESCALE: f64 = 1000.0;

/// Median of the given values; `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn group_medians<K: Ord>(
    rows: &[Record],
    key: impl Fn(&Record) -> K,
    value: impl Fn(&Record) -> Option<f64>,
) -> BTreeMap<K, f64> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for record in rows {
        let bucket = groups.entry(key(record)).or_default();
        if let Some(observed) = value(record) {
            bucket.push(observed);
        }
    }

    groups
        .into_iter()
        .filter_map(|(group, mut values)| median(&mut values).map(|m| (group, m)))
        .collect()
}

/// Fills `classroom_density` from `avg_class_size`: gaps take the entity's own
/// median first, then the department median of the entity-filled column, and
/// anything still above the outlier threshold is divided by the rescale factor.
pub(crate) fn impute_classroom_density(rows: &mut [Record]) {
    let by_entity = group_medians(rows, |record| record.entity_id, |record| record.avg_class_size);
    for record in rows.iter_mut() {
        record.classroom_density = record
            .avg_class_size
            .or_else(|| by_entity.get(&record.entity_id).copied());
    }

    let by_department = group_medians(
        rows,
        |record| record.department_id,
        |record| record.classroom_density,
    );
    for record in rows.iter_mut() {
        if record.classroom_density.is_none() {
            record.classroom_density = by_department.get(&record.department_id).copied();
        }
    }

    for record in rows.iter_mut() {
        if let Some(density) = record.classroom_density {
            if density > CLASS_SIZE_OUTLIER {
                record.classroom_density = Some(density / CLASS_SIZE_RESCALE);
            }
        }
    }
}
