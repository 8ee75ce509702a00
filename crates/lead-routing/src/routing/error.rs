/// Raised when a rule, configuration, or routing payload does not conform to its schema.
///
/// Every variant is detected before any clause or factor logic runs, so a failing payload
/// never produces a partial evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("{shape} payload is malformed: {message}")]
    Malformed { shape: &'static str, message: String },
    #[error("time window {field} '{value}' must be HH:MM between 00:00 and 23:59")]
    InvalidClock { field: &'static str, value: String },
    #[error("time window day {0} is outside 0..=6 (Sunday = 0)")]
    DayOutOfRange(u8),
    #[error("unknown IANA time zone '{0}'")]
    UnknownTimezone(String),
    #[error("price band {field} must be a finite, non-negative amount")]
    InvalidPriceBound { field: &'static str },
    #[error("price band min {min} exceeds max {max}")]
    InvertedPriceBand { min: f64, max: f64 },
    #[error("routing config {field} must be finite and non-negative (got {value})")]
    InvalidWeight { field: &'static str, value: f64 },
    #[error("minimum_score must be between 0 and 1 (got {0})")]
    MinimumScoreOutOfRange(f64),
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error("rule '{rule_id}' must list at least one target")]
    EmptyTargets { rule_id: String },
}

impl SchemaValidationError {
    pub(crate) fn malformed(shape: &'static str, source: serde_json::Error) -> Self {
        Self::Malformed {
            shape,
            message: source.to_string(),
        }
    }
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), SchemaValidationError> {
    if value.trim().is_empty() {
        return Err(SchemaValidationError::MissingField { field });
    }
    Ok(())
}
