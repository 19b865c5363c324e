//! Checks applied to a subscription's filters before it is persisted

use crate::backend::Catalog;
use crate::cast::{self, Datum, PgType};
use crate::errors::Error;
use crate::models::realtime::{Entity, Op, UserDefinedFilter};

/// Largest array accepted by an `in` filter
pub const MAX_IN_VALUES: usize = 100;

/// Sort filters by `(column_name, op, value)`
pub fn canonicalize(mut filters: Vec<UserDefinedFilter>) -> Vec<UserDefinedFilter> {
    filters.sort();
    filters
}

/// Validate `filters` against the columns `role` may select on `entity` and
/// return them in canonical order
pub fn validate_filters<C: Catalog>(
    catalog: &mut C,
    entity: &Entity,
    role: &str,
    filters: Vec<UserDefinedFilter>,
) -> Result<Vec<UserDefinedFilter>, Error> {
    if filters.is_empty() {
        return Ok(filters);
    }

    let columns = catalog.selectable_columns(entity, role)?;

    for filter in &filters {
        let column = columns
            .iter()
            .find(|x| x.name == filter.column_name)
            .ok_or_else(|| Error::Validation("invalid column for filter".to_string()))?;

        let type_ = PgType::from_name(&column.type_).ok_or_else(|| {
            Error::Validation("failed to lookup type for column".to_string())
        })?;

        match filter.op {
            Op::In => match cast::parse(&filter.value, &type_.array_of())? {
                Datum::Array(items) if items.len() > MAX_IN_VALUES => {
                    return Err(Error::Validation(format!(
                        "too many values for `in` filter. Maximum {}",
                        MAX_IN_VALUES
                    )))
                }
                _ => {}
            },
            _ => {
                cast::parse(&filter.value, &type_)?;
            }
        }
    }

    Ok(canonicalize(filters))
}
