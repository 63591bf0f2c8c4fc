//! Flattening per-step records into a single data map.

use crate::core::fields::FieldData;

/// Merge step records in step order. Later steps overwrite earlier values on
/// key collision.
pub fn merge_records<'a, I>(records: I) -> FieldData
where
    I: IntoIterator<Item = &'a (u32, FieldData)>,
{
    let mut merged = FieldData::new();
    for (_, fields) in records {
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
