use chrono::{DateTime, Utc};

use super::super::context::{ConsentState, ListingFacts, PersonFacts};
use super::clock::ResolvedWindow;
use super::schema::{
    BuyerRepRequirement, ConsentCondition, ConsentRequirement, GeographyFilter,
    PriceBandCondition, TermFilter,
};
use super::{ConditionCheck, ConditionKey};

pub(crate) fn geography(
    filter: &GeographyFilter,
    listing: Option<&ListingFacts>,
) -> ConditionCheck {
    let Some(listing) = listing else {
        return ConditionCheck::fail(ConditionKey::Geography, "no listing context");
    };

    let granularities = [
        ("state", &filter.states, listing.state.as_deref()),
        ("city", &filter.cities, listing.city.as_deref()),
        ("postal code", &filter.postal_codes, listing.postal_code.as_deref()),
    ];
    for (label, terms, value) in granularities {
        if let Err(detail) = terms.admits(label, value) {
            return ConditionCheck::fail(ConditionKey::Geography, detail);
        }
    }

    ConditionCheck::pass(ConditionKey::Geography)
}

pub(crate) fn price_band(
    band: &PriceBandCondition,
    listing: Option<&ListingFacts>,
) -> ConditionCheck {
    let Some(price) = listing.and_then(|listing| listing.price) else {
        return ConditionCheck::fail(ConditionKey::PriceBand, "no listing price");
    };

    if let Some(min) = band.min {
        if price < min {
            return ConditionCheck::fail(
                ConditionKey::PriceBand,
                format!("price {price} is below minimum {min}"),
            );
        }
    }
    if let Some(max) = band.max {
        if price > max {
            return ConditionCheck::fail(
                ConditionKey::PriceBand,
                format!("price {price} is above maximum {max}"),
            );
        }
    }

    ConditionCheck::pass(ConditionKey::PriceBand)
}

pub(crate) fn sources(filter: &TermFilter, person: &PersonFacts) -> ConditionCheck {
    match filter.admits("source", person.source.as_deref()) {
        Ok(()) => ConditionCheck::pass(ConditionKey::Sources),
        Err(detail) => ConditionCheck::fail(ConditionKey::Sources, detail),
    }
}

pub(crate) fn consent(clause: &ConsentCondition, person: &PersonFacts) -> ConditionCheck {
    let failures: Vec<String> = [
        channel_consent("sms", clause.sms, person.consent.sms),
        channel_consent("email", clause.email, person.consent.email),
    ]
    .into_iter()
    .flatten()
    .collect();

    if failures.is_empty() {
        ConditionCheck::pass(ConditionKey::Consent)
    } else {
        ConditionCheck::fail(ConditionKey::Consent, failures.join("; "))
    }
}

fn channel_consent(
    channel: &str,
    requirement: ConsentRequirement,
    state: ConsentState,
) -> Option<String> {
    match (requirement, state) {
        (ConsentRequirement::Optional, _) => None,
        (ConsentRequirement::Granted, ConsentState::Granted) => None,
        (ConsentRequirement::Granted, other) => Some(format!(
            "{channel} consent is {} but GRANTED is required",
            other.label()
        )),
        (ConsentRequirement::NotRevoked, ConsentState::Revoked) => {
            Some(format!("{channel} consent has been revoked"))
        }
        (ConsentRequirement::NotRevoked, _) => None,
    }
}

pub(crate) fn buyer_rep(requirement: BuyerRepRequirement, person: &PersonFacts) -> ConditionCheck {
    let status = person
        .buyer_rep_status
        .as_deref()
        .map(|status| status.trim().to_ascii_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let active = status == "ACTIVE";

    match requirement {
        BuyerRepRequirement::Any => ConditionCheck::pass(ConditionKey::BuyerRep),
        BuyerRepRequirement::RequiredActive if !active => ConditionCheck::fail(
            ConditionKey::BuyerRep,
            format!("buyer representation is {status}; ACTIVE required"),
        ),
        BuyerRepRequirement::ProhibitActive if active => ConditionCheck::fail(
            ConditionKey::BuyerRep,
            "buyer already has an active representation agreement",
        ),
        _ => ConditionCheck::pass(ConditionKey::BuyerRep),
    }
}

pub(crate) fn time_windows(windows: &[ResolvedWindow], now: DateTime<Utc>) -> ConditionCheck {
    match windows.iter().position(|window| window.contains(now)) {
        Some(index) => ConditionCheck {
            key: ConditionKey::TimeWindows,
            passed: true,
            detail: Some(format!("inside window {index}")),
        },
        None => ConditionCheck::fail(
            ConditionKey::TimeWindows,
            format!("outside all {} configured window(s)", windows.len()),
        ),
    }
}
