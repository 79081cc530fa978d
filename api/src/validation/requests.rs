//! Binding tables for the API's request records
//!
//! Each table lists, in declaration order, where a field comes from and the
//! rules it must satisfy.

use binder_shared::models::{AdminWrite, CombinedParams, NamedBody, ParentChildPath, QueryParams};

use super::binding::{Bindable, FieldSpec, Rule, Source};

// ─────────────────────────────────────────────────────────────────────────────
// Constants for validation rules
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum length of the `test` query parameter
const MIN_TEST_LENGTH: usize = 3;
/// Maximum length of the `test` query parameter
const MAX_TEST_LENGTH: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Path records
// ─────────────────────────────────────────────────────────────────────────────

impl Bindable for ParentChildPath {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("ParentID", "parentId", Source::Path),
        FieldSpec::text("ChildID", "childId", Source::Path),
    ];
}

// ─────────────────────────────────────────────────────────────────────────────
// Query records
// ─────────────────────────────────────────────────────────────────────────────

impl Bindable for QueryParams {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("Test", "test", Source::Query).with_rules(&[
            Rule::Required,
            Rule::Length {
                min: MIN_TEST_LENGTH,
                max: MAX_TEST_LENGTH,
            },
        ]),
        FieldSpec::timestamp("Earliest", "earliest", Source::Query),
        FieldSpec::timestamp("Latest", "latest", Source::Query)
            .with_rules(&[Rule::After("Earliest"), Rule::NotAfterNow]),
    ];
}

// ─────────────────────────────────────────────────────────────────────────────
// Body records
// ─────────────────────────────────────────────────────────────────────────────

impl Bindable for NamedBody {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("name", "name", Source::Body).with_rules(&[Rule::Required]),
        FieldSpec::text("desc", "desc", Source::Body),
    ];
}

impl Bindable for AdminWrite {
    const FIELDS: &'static [FieldSpec] =
        &[FieldSpec::text("value", "value", Source::Body).with_rules(&[Rule::Required])];
}

// ─────────────────────────────────────────────────────────────────────────────
// Multi-source records
// ─────────────────────────────────────────────────────────────────────────────

impl Bindable for CombinedParams {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("Path", "id", Source::Path),
        FieldSpec::text("Query", "q", Source::Query),
        FieldSpec::text("data", "data", Source::Body).with_rules(&[Rule::Required]),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::binding::{bind_body, bind_query, BindError, Binder};
    use binder_shared::time::zero_time;
    use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn query(items: &[(&str, String)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_query_length_bounds() {
        for test in ["ab", "abcdefghijk", ""] {
            let err = bind_query::<QueryParams>(&query(&[("test", test.into())]), now());
            assert!(err.unwrap_err().is_validation(), "{test:?} should be rejected");
        }
        for test in ["abc", "abcdefghij"] {
            let params = bind_query::<QueryParams>(&query(&[("test", test.into())]), now());
            assert_eq!(params.unwrap().test, test);
        }
    }

    #[test]
    fn test_query_valid_window_is_echoed() {
        let earliest = now() - Duration::hours(2);
        let latest = now() - Duration::hours(1);
        let params: QueryParams = bind_query(
            &query(&[
                ("test", "valid".into()),
                ("earliest", earliest.to_rfc3339()),
                ("latest", latest.to_rfc3339()),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(params.earliest, earliest);
        assert_eq!(params.latest, latest);
    }

    #[test]
    fn test_query_latest_before_earliest() {
        let err = bind_query::<QueryParams>(
            &query(&[
                ("test", "valid".into()),
                ("earliest", now().to_rfc3339()),
                ("latest", (now() - Duration::hours(1)).to_rfc3339()),
            ]),
            now(),
        )
        .unwrap_err();
        match err {
            BindError::Validation(fe) => assert_eq!(fe.field, "latest"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_query_latest_in_future() {
        let err = bind_query::<QueryParams>(
            &query(&[
                ("test", "valid".into()),
                ("latest", (now() + Duration::hours(1)).to_rfc3339()),
            ]),
            now(),
        );
        assert!(err.unwrap_err().is_validation());
    }

    #[test]
    fn test_query_default_latest_applied_by_caller() {
        let clock_now = now() + Duration::milliseconds(640);
        let params = bind_query::<QueryParams>(&query(&[("test", "valid".into())]), clock_now)
            .unwrap()
            .with_default_latest(clock_now);
        assert_eq!(params.earliest, zero_time());
        assert_eq!(params.latest, clock_now.trunc_subsecs(0));
    }

    #[test]
    fn test_named_body_requires_name() {
        assert!(bind_body::<NamedBody>(br#"{"desc": "d"}"#, now())
            .unwrap_err()
            .is_validation());

        let body: NamedBody = bind_body(br#"{"name": "n", "desc": "d"}"#, now()).unwrap();
        assert_eq!(body.name, "n");
        assert_eq!(body.desc, "d");
    }

    #[test]
    fn test_combined_params_from_three_sources() {
        let mut binder = Binder::for_record::<CombinedParams>(now());
        let path = HashMap::from([("id".to_string(), "path".to_string())]);
        assert!(binder.bind_path(&path).is_err());
        assert!(binder
            .bind_query(&query(&[("q", "query".into())]))
            .is_err());
        binder.bind_body(br#"{"data": "body"}"#).unwrap();

        let params: CombinedParams = binder.finish().unwrap();
        assert_eq!(params.path, "path");
        assert_eq!(params.query, "query");
        assert_eq!(params.data, "body");
    }

    #[test]
    fn test_combined_params_missing_data() {
        let mut binder = Binder::for_record::<CombinedParams>(now());
        let err = binder.bind_body(br#"{"other": "x"}"#).unwrap_err();
        assert!(err.is_validation());
    }
}
