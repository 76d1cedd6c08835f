//! Column-to-field name normalization.

use tracing::trace;

use crate::error::{InterceptError, Result};
use crate::handler::ScopeMap;

const UNDERSCORE: char = '_';

/// Converts an underscore separated column name to camelCase.
///
/// The first segment is kept verbatim, even when a leading underscore makes
/// it empty; every later non-empty segment has its first character
/// uppercased and the remainder kept as written. Empty segments contribute
/// nothing, so `_phone_number` becomes `PhoneNumber`.
///
/// ```rust
/// use oxide_intercept::naming::underscore_to_camel_case;
///
/// assert_eq!(underscore_to_camel_case("test_table_name").unwrap(), "testTableName");
/// ```
///
/// # Errors
///
/// Returns [`InterceptError::IllegalArgument`] for an empty name.
pub fn underscore_to_camel_case(underscore_name: &str) -> Result<String> {
    if underscore_name.is_empty() {
        return Err(InterceptError::IllegalArgument(String::from(
            "column name must not be empty",
        )));
    }

    let mut segments = underscore_name.split(UNDERSCORE);
    let mut result = String::with_capacity(underscore_name.len());
    if let Some(first) = segments.next() {
        result.push_str(first);
    }
    for segment in segments {
        let mut chars = segment.chars();
        if let Some(head) = chars.next() {
            result.extend(head.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    trace!(from = underscore_name, to = %result, "converted column name to camel case");
    Ok(result)
}

/// Returns the columns registered for `table_name`, or an empty slice.
///
/// The lookup is exact and case-sensitive. Wildcard entries are not
/// consulted here; the handler registry resolves those at dispatch time.
#[must_use]
pub fn determine_target_field_names<'a>(scope: &'a ScopeMap, table_name: &str) -> &'a [String] {
    scope.get(table_name).map(Vec::as_slice).unwrap_or_default()
}
