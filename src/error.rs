use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("student not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Error code carried in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "bad_params",
            StoreError::NotFound(_) => "not_found",
            StoreError::Unavailable(_) => "store_unavailable",
        }
    }

    /// Status an HTTP front end returns for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 400,
            StoreError::NotFound(_) => 404,
            StoreError::Unavailable(_) => 500,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Unavailable(format!("{e:#}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("data file is not valid JSON: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_distinct_codes_and_statuses() {
        let v = StoreError::validation("name must not be empty");
        let n = StoreError::NotFound("x".into());
        let u = StoreError::from(std::io::Error::other("disk gone"));
        assert_eq!((v.code(), v.http_status()), ("bad_params", 400));
        assert_eq!((n.code(), n.http_status()), ("not_found", 404));
        assert_eq!((u.code(), u.http_status()), ("store_unavailable", 500));
        assert!(u.to_string().contains("disk gone"));
    }
}
