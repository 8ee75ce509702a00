use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact permission recorded for a single outreach channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    Granted,
    Revoked,
    #[default]
    Unknown,
}

impl ConsentState {
    pub const fn label(self) -> &'static str {
        match self {
            ConsentState::Granted => "GRANTED",
            ConsentState::Revoked => "REVOKED",
            ConsentState::Unknown => "UNKNOWN",
        }
    }
}

/// Per-channel consent. Missing channels deserialize as [`ConsentState::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConsent {
    #[serde(default)]
    pub sms: ConsentState,
    #[serde(default)]
    pub email: ConsentState,
}

/// Facts about the person behind the lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_rep_status: Option<String>,
    #[serde(default)]
    pub consent: ChannelConsent,
}

/// Listing the lead inquired about, when there is one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Facts a rule's conditions are evaluated against. Built fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingContext {
    pub now: DateTime<Utc>,
    /// Display only; each time window resolves `now` in its own zone.
    #[serde(default = "default_tenant_timezone")]
    pub tenant_timezone: String,
    #[serde(default)]
    pub person: PersonFacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingFacts>,
}

fn default_tenant_timezone() -> String {
    "UTC".to_string()
}

impl RoutingContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            tenant_timezone: default_tenant_timezone(),
            person: PersonFacts::default(),
            listing: None,
        }
    }

    pub fn with_person(mut self, person: PersonFacts) -> Self {
        self.person = person;
        self
    }

    pub fn with_listing(mut self, listing: ListingFacts) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn with_tenant_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.tenant_timezone = timezone.into();
        self
    }
}
