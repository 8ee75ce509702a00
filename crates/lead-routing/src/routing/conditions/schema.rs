use serde::{Deserialize, Serialize};

use super::super::error::SchemaValidationError;
use super::clock::ResolvedWindow;

/// Declarative preconditions of a routing rule. Every present clause must pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<GeographyCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_band: Option<PriceBandCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourceCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<ConsentCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_rep: Option<BuyerRepCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_windows: Option<Vec<TimeWindow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeographyCondition {
    #[serde(default)]
    pub include_states: Vec<String>,
    #[serde(default)]
    pub exclude_states: Vec<String>,
    #[serde(default)]
    pub include_cities: Vec<String>,
    #[serde(default)]
    pub exclude_cities: Vec<String>,
    #[serde(default)]
    pub include_postal_codes: Vec<String>,
    #[serde(default)]
    pub exclude_postal_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceBandCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceCondition {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// What a consent clause demands of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentRequirement {
    #[default]
    Optional,
    Granted,
    NotRevoked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentCondition {
    #[serde(default)]
    pub sms: ConsentRequirement,
    #[serde(default)]
    pub email: ConsentRequirement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyerRepRequirement {
    #[default]
    Any,
    RequiredActive,
    ProhibitActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyerRepCondition {
    #[serde(default)]
    pub requirement: BuyerRepRequirement,
}

/// Local-time window in its own IANA zone. `start > end` wraps midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    pub timezone: String,
    pub start: String,
    pub end: String,
    /// Day-of-week filter, Sunday = 0. Empty means every day.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<u8>,
}

impl TimeWindow {
    pub fn new(
        timezone: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            timezone: timezone.into(),
            start: start.into(),
            end: end.into(),
            days: Vec::new(),
        }
    }

    pub fn on_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.days = days.into_iter().collect();
        self
    }
}

impl RoutingConditions {
    /// Parse an untyped payload; `null` means "no conditions".
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>, SchemaValidationError> {
        if value.is_null() {
            return Ok(None);
        }
        Self::deserialize(value)
            .map(Some)
            .map_err(|err| SchemaValidationError::malformed("routing conditions", err))
    }

    /// Check and normalise every clause. Clause evaluation only runs on the result.
    pub fn validate(&self) -> Result<ValidatedConditions, SchemaValidationError> {
        let geography = self.geography.as_ref().map(|geo| GeographyFilter {
            states: TermFilter::new(&geo.include_states, &geo.exclude_states),
            cities: TermFilter::new(&geo.include_cities, &geo.exclude_cities),
            postal_codes: TermFilter::new(&geo.include_postal_codes, &geo.exclude_postal_codes),
        });

        let price_band = self.price_band.map(validate_price_band).transpose()?;

        let sources = self
            .sources
            .as_ref()
            .map(|sources| TermFilter::new(&sources.include, &sources.exclude));

        let time_windows = self
            .time_windows
            .as_ref()
            .map(|windows| {
                windows
                    .iter()
                    .map(ResolvedWindow::resolve)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ValidatedConditions {
            geography,
            price_band,
            sources,
            consent: self.consent,
            buyer_rep: self.buyer_rep.map(|clause| clause.requirement),
            time_windows,
        })
    }
}

fn validate_price_band(
    band: PriceBandCondition,
) -> Result<PriceBandCondition, SchemaValidationError> {
    for (field, bound) in [("min", band.min), ("max", band.max)] {
        if let Some(value) = bound {
            if !value.is_finite() || value < 0.0 {
                return Err(SchemaValidationError::InvalidPriceBound { field });
            }
        }
    }
    if let (Some(min), Some(max)) = (band.min, band.max) {
        if min > max {
            return Err(SchemaValidationError::InvertedPriceBand { min, max });
        }
    }
    Ok(band)
}

/// Conditions that passed validation, with lists lower-cased and windows resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConditions {
    pub(crate) geography: Option<GeographyFilter>,
    pub(crate) price_band: Option<PriceBandCondition>,
    pub(crate) sources: Option<TermFilter>,
    pub(crate) consent: Option<ConsentCondition>,
    pub(crate) buyer_rep: Option<BuyerRepRequirement>,
    pub(crate) time_windows: Option<Vec<ResolvedWindow>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeographyFilter {
    pub(crate) states: TermFilter,
    pub(crate) cities: TermFilter,
    pub(crate) postal_codes: TermFilter,
}

/// Case-insensitive include/exclude list pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TermFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TermFilter {
    fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().map(|term| normalize_term(term)).collect(),
            exclude: exclude.iter().map(|term| normalize_term(term)).collect(),
        }
    }

    /// A non-empty include list restricts; the exclude list forbids.
    pub(crate) fn admits(&self, label: &str, value: Option<&str>) -> Result<(), String> {
        let value = value.map(normalize_term);

        if !self.include.is_empty() {
            match &value {
                Some(term) if self.include.contains(term) => {}
                Some(term) => return Err(format!("{label} '{term}' is not in the include list")),
                None => return Err(format!("{label} is missing but an include list is set")),
            }
        }

        if let Some(term) = &value {
            if self.exclude.contains(term) {
                return Err(format!("{label} '{term}' is excluded"));
            }
        }

        Ok(())
    }
}

pub(crate) fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}
