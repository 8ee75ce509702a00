use super::common::*;
use serde_json::json;

use crate::routing::conditions::{
    evaluate, quiet_hours, BuyerRepCondition, BuyerRepRequirement, ConditionKey,
    ConsentCondition, ConsentRequirement, GeographyCondition, PriceBandCondition,
    RoutingConditions, SourceCondition, TimeWindow,
};
use crate::routing::context::{ConsentState, RoutingContext};
use crate::routing::SchemaValidationError;

fn geography(include_states: &[&str]) -> GeographyCondition {
    GeographyCondition {
        include_states: include_states.iter().map(|state| state.to_string()).collect(),
        ..GeographyCondition::default()
    }
}

fn evaluate_with(
    conditions: RoutingConditions,
    context: &RoutingContext,
) -> crate::routing::ConditionEvaluation {
    evaluate(Some(&conditions), context).expect("conditions validate")
}

#[test]
fn absent_conditions_always_match() {
    let evaluation = evaluate(None, &context()).expect("no validation needed");
    assert!(evaluation.matched);
    assert!(evaluation.checks.is_empty());

    let bare = RoutingContext::new(instant(2024, 2, 29, 0, 0));
    assert!(evaluate(None, &bare).unwrap().matched);
}

#[test]
fn empty_condition_set_matches_without_checks() {
    let evaluation = evaluate_with(RoutingConditions::default(), &context());
    assert!(evaluation.matched);
    assert!(evaluation.checks.is_empty());
}

#[test]
fn clauses_are_combined_with_and() {
    let failing = RoutingConditions {
        geography: Some(geography(&["TX"])),
        price_band: Some(PriceBandCondition {
            min: None,
            max: Some(300_000.0),
        }),
        ..RoutingConditions::default()
    };
    let evaluation = evaluate_with(failing, &context());
    assert!(!evaluation.matched);
    assert_eq!(evaluation.checks.len(), 2);
    assert!(evaluation.checks[0].passed);
    assert!(!evaluation.checks[1].passed);

    let passing = RoutingConditions {
        geography: Some(geography(&["TX"])),
        price_band: Some(PriceBandCondition {
            min: Some(400_000.0),
            max: Some(500_000.0),
        }),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(passing, &context()).matched);
}

#[test]
fn checks_follow_fixed_clause_order() {
    let conditions = RoutingConditions {
        time_windows: Some(vec![TimeWindow::new("UTC", "00:00", "23:59")]),
        buyer_rep: Some(BuyerRepCondition::default()),
        consent: Some(ConsentCondition::default()),
        sources: Some(SourceCondition::default()),
        price_band: Some(PriceBandCondition::default()),
        geography: Some(GeographyCondition::default()),
    };

    let keys: Vec<ConditionKey> = evaluate_with(conditions, &context())
        .checks
        .into_iter()
        .map(|check| check.key)
        .collect();

    assert_eq!(
        keys,
        vec![
            ConditionKey::Geography,
            ConditionKey::PriceBand,
            ConditionKey::Sources,
            ConditionKey::Consent,
            ConditionKey::BuyerRep,
            ConditionKey::TimeWindows,
        ]
    );
}

#[test]
fn geography_fails_without_listing() {
    let context = RoutingContext::new(instant(2025, 1, 15, 15, 0)).with_person(zillow_person());
    let conditions = RoutingConditions {
        geography: Some(GeographyCondition::default()),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context);
    assert!(!evaluation.matched);
    assert_eq!(evaluation.checks[0].detail.as_deref(), Some("no listing context"));
}

#[test]
fn geography_matching_ignores_case() {
    let conditions = RoutingConditions {
        geography: Some(GeographyCondition {
            include_states: vec!["tx".to_string()],
            include_cities: vec!["AUSTIN".to_string(), "Round Rock".to_string()],
            ..GeographyCondition::default()
        }),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(conditions, &context()).matched);
}

#[test]
fn geography_exclusions_forbid_matches() {
    let conditions = RoutingConditions {
        geography: Some(GeographyCondition {
            exclude_postal_codes: vec!["78701".to_string()],
            ..GeographyCondition::default()
        }),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context());
    assert!(!evaluation.matched);
    let detail = evaluation.checks[0].detail.clone().unwrap_or_default();
    assert!(detail.contains("postal code"), "unexpected detail {detail}");
}

#[test]
fn geography_reports_first_failing_granularity() {
    let conditions = RoutingConditions {
        geography: Some(GeographyCondition {
            exclude_states: vec!["TX".to_string()],
            include_cities: vec!["Dallas".to_string()],
            ..GeographyCondition::default()
        }),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context());
    let detail = evaluation.checks[0].detail.clone().unwrap_or_default();
    assert!(detail.starts_with("state"), "unexpected detail {detail}");
}

#[test]
fn geography_include_list_requires_a_value() {
    let mut context = context();
    if let Some(listing) = context.listing.as_mut() {
        listing.city = None;
    }
    let conditions = RoutingConditions {
        geography: Some(GeographyCondition {
            include_cities: vec!["Austin".to_string()],
            exclude_postal_codes: vec!["73301".to_string()],
            ..GeographyCondition::default()
        }),
        ..RoutingConditions::default()
    };
    assert!(!evaluate_with(conditions, &context).matched);
}

#[test]
fn price_band_requires_price_and_is_inclusive() {
    let band = PriceBandCondition {
        min: Some(450_000.0),
        max: Some(450_000.0),
    };
    let conditions = RoutingConditions {
        price_band: Some(band),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(conditions.clone(), &context()).matched);

    let mut unpriced = context();
    if let Some(listing) = unpriced.listing.as_mut() {
        listing.price = None;
    }
    let evaluation = evaluate_with(conditions, &unpriced);
    assert!(!evaluation.matched);
    assert_eq!(evaluation.checks[0].detail.as_deref(), Some("no listing price"));
}

#[test]
fn sources_include_and_exclude_lists() {
    let include = RoutingConditions {
        sources: Some(SourceCondition {
            include: vec!["zillow".to_string(), "realtor.com".to_string()],
            exclude: Vec::new(),
        }),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(include.clone(), &context()).matched);

    let exclude = RoutingConditions {
        sources: Some(SourceCondition {
            include: Vec::new(),
            exclude: vec!["ZILLOW".to_string()],
        }),
        ..RoutingConditions::default()
    };
    assert!(!evaluate_with(exclude.clone(), &context()).matched);

    let mut anonymous = context();
    anonymous.person.source = None;
    assert!(!evaluate_with(include, &anonymous).matched);
    assert!(evaluate_with(exclude, &anonymous).matched);
}

#[test]
fn consent_requirements_per_channel() {
    let not_revoked = RoutingConditions {
        consent: Some(ConsentCondition {
            sms: ConsentRequirement::Granted,
            email: ConsentRequirement::NotRevoked,
        }),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(not_revoked, &context()).matched);

    let granted_email = RoutingConditions {
        consent: Some(ConsentCondition {
            sms: ConsentRequirement::Optional,
            email: ConsentRequirement::Granted,
        }),
        ..RoutingConditions::default()
    };
    assert!(!evaluate_with(granted_email, &context()).matched);
}

#[test]
fn consent_failures_from_both_channels_are_concatenated() {
    let mut context = context();
    context.person.consent.sms = ConsentState::Revoked;
    let conditions = RoutingConditions {
        consent: Some(ConsentCondition {
            sms: ConsentRequirement::NotRevoked,
            email: ConsentRequirement::Granted,
        }),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context);
    let detail = evaluation.checks[0].detail.clone().unwrap_or_default();
    assert!(!evaluation.matched);
    assert!(detail.contains("sms") && detail.contains("email"), "{detail}");
    assert!(detail.contains("; "));
}

#[test]
fn buyer_representation_requirements() {
    let requirement = |requirement| RoutingConditions {
        buyer_rep: Some(BuyerRepCondition { requirement }),
        ..RoutingConditions::default()
    };

    let mut active = context();
    active.person.buyer_rep_status = Some("active".to_string());
    let unknown = context();

    assert!(evaluate_with(requirement(BuyerRepRequirement::Any), &unknown).matched);
    assert!(evaluate_with(requirement(BuyerRepRequirement::RequiredActive), &active).matched);
    assert!(!evaluate_with(requirement(BuyerRepRequirement::RequiredActive), &unknown).matched);
    assert!(!evaluate_with(requirement(BuyerRepRequirement::ProhibitActive), &active).matched);
    assert!(evaluate_with(requirement(BuyerRepRequirement::ProhibitActive), &unknown).matched);
}

#[test]
fn any_time_window_is_enough() {
    let conditions = RoutingConditions {
        time_windows: Some(vec![
            TimeWindow::new("America/Chicago", "18:00", "20:00"),
            TimeWindow::new("America/Chicago", "08:00", "10:00"),
        ]),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context());
    assert!(evaluation.matched);
    assert_eq!(evaluation.checks[0].detail.as_deref(), Some("inside window 1"));
}

#[test]
fn overnight_window_wraps_midnight() {
    let conditions = RoutingConditions {
        time_windows: Some(vec![TimeWindow::new("UTC", "22:00", "06:00")]),
        ..RoutingConditions::default()
    };

    for (hour, minute, expected) in [(23, 30, true), (2, 0, true), (12, 0, false)] {
        let context = RoutingContext::new(instant(2025, 3, 4, hour, minute));
        assert_eq!(
            evaluate_with(conditions.clone(), &context).matched,
            expected,
            "{hour:02}:{minute:02}"
        );
    }
}

#[test]
fn overnight_window_uses_its_own_zone() {
    // 03:30 UTC on 2025-07-01 is 23:30 EDT on 2025-06-30.
    let conditions = RoutingConditions {
        time_windows: Some(vec![TimeWindow::new("America/New_York", "22:00", "06:00")]),
        ..RoutingConditions::default()
    };
    let context = RoutingContext::new(instant(2025, 7, 1, 3, 30)).with_tenant_timezone("UTC");
    assert!(evaluate_with(conditions, &context).matched);
}

#[test]
fn day_filter_restricts_windows() {
    // The fixture instant is a Wednesday (3).
    let weekend = RoutingConditions {
        time_windows: Some(vec![TimeWindow::new("UTC", "00:00", "23:59").on_days([0, 6])]),
        ..RoutingConditions::default()
    };
    assert!(!evaluate_with(weekend, &context()).matched);

    let midweek = RoutingConditions {
        time_windows: Some(vec![TimeWindow::new("UTC", "00:00", "23:59").on_days([3])]),
        ..RoutingConditions::default()
    };
    assert!(evaluate_with(midweek, &context()).matched);
}

#[test]
fn malformed_clock_fails_before_evaluation() {
    let conditions = RoutingConditions {
        geography: Some(geography(&["TX"])),
        time_windows: Some(vec![TimeWindow::new("UTC", "8am", "17:00")]),
        ..RoutingConditions::default()
    };

    let err = evaluate(Some(&conditions), &context()).expect_err("clock rejected");
    assert!(matches!(err, SchemaValidationError::InvalidClock { field: "start", .. }));
}

#[test]
fn schema_rejects_bad_shapes() {
    assert_eq!(
        RoutingConditions::from_json(&serde_json::Value::Null).expect("null accepted"),
        None
    );
    assert!(matches!(
        RoutingConditions::from_json(&json!({ "budget": { "min": 1 } })),
        Err(SchemaValidationError::Malformed { .. })
    ));
    assert!(matches!(
        RoutingConditions::from_json(&json!({ "sources": { "include": "zillow" } })),
        Err(SchemaValidationError::Malformed { .. })
    ));
    assert!(matches!(
        RoutingConditions::from_json(&json!({ "time_windows": [
            { "timezone": "UTC", "start": "08:00", "end": "09:00", "days": [-1] }
        ] })),
        Err(SchemaValidationError::Malformed { .. })
    ));

    let day_nine = RoutingConditions::from_json(&json!({ "time_windows": [
        { "timezone": "UTC", "start": "08:00", "end": "09:00", "days": [9] }
    ] }))
    .expect("shape parses")
    .expect("conditions present");
    assert_eq!(day_nine.validate(), Err(SchemaValidationError::DayOutOfRange(9)));

    let inverted = RoutingConditions {
        price_band: Some(PriceBandCondition {
            min: Some(500_000.0),
            max: Some(100_000.0),
        }),
        ..RoutingConditions::default()
    };
    assert!(matches!(
        inverted.validate(),
        Err(SchemaValidationError::InvertedPriceBand { .. })
    ));
}

#[test]
fn empty_window_list_fails_the_clause() {
    let conditions = RoutingConditions {
        time_windows: Some(Vec::new()),
        ..RoutingConditions::default()
    };

    let evaluation = evaluate_with(conditions, &context());
    assert!(!evaluation.matched);
    assert_eq!(evaluation.checks.len(), 1);
    assert_eq!(evaluation.checks[0].key, ConditionKey::TimeWindows);
    assert_eq!(
        evaluation.checks[0].detail.as_deref(),
        Some("outside all 0 configured window(s)")
    );
}

#[test]
fn quiet_hours_follow_window_semantics() {
    let windows = vec![TimeWindow::new("America/Chicago", "21:00", "08:00")];
    // 13:30 UTC is 07:30 in Chicago in January.
    assert!(quiet_hours(&windows, instant(2025, 1, 15, 13, 30)).unwrap());
    assert!(!quiet_hours(&windows, instant(2025, 1, 15, 18, 0)).unwrap());
    assert!(!quiet_hours(&[], instant(2025, 1, 15, 13, 30)).unwrap());
    let unknown_zone = [TimeWindow::new("Nowhere/City", "21:00", "08:00")];
    assert!(quiet_hours(&unknown_zone, instant(2025, 1, 15, 13, 30)).is_err());
}
