pub mod core;
pub mod dashboard;
pub mod students;

use super::types::Request;

/// Trimmed string param; missing, null and non-string values read as `None`.
pub(crate) fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str()).map(str::trim)
}
