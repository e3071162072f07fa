// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unlabeled_identity_is_item_list() {
    let a = Series::parse("A,B,C").unwrap();
    let b = Series::parse("A,B,C").unwrap();
    assert_eq!(a, b);
    assert!(!a.is_labeled());
    assert_eq!(a.items(), ["A", "B", "C"]);
}

#[test]
fn labeled_identity_is_label_only() {
    let a = Series::parse("my:A,B").unwrap();
    let b = Series::parse("my:X,Y,Z").unwrap();
    assert_eq!(a, b, "labeled series are identified by label alone");
}

#[test]
fn different_unlabeled_series_are_distinct() {
    let a = Series::parse("A,B").unwrap();
    let b = Series::parse("1,2").unwrap();
    assert_ne!(a, b);
}

#[yare::parameterized(
    plain = { "A,B", false },
    labeled = { "my:A,B", true },
    single_item = { "A", false },
)]
fn parse_distinguishes_label(inner: &str, expect_labeled: bool) {
    let series = Series::parse(inner).unwrap();
    assert_eq!(series.is_labeled(), expect_labeled);
}

#[test]
fn first_series_finds_first_occurrence() {
    let series = first_series("echo test{{A,B}}{{1,2}}").unwrap().unwrap();
    assert_eq!(series.items(), ["A", "B"]);
}

#[test]
fn first_series_none_when_absent() {
    assert!(first_series("echo Hello").is_none());
}

#[test]
fn substitute_cross_product_leaves_other_series() {
    let series = first_series("test{{A,B}}{{1,2}}").unwrap().unwrap();
    let out = substitute("test{{A,B}}{{1,2}}", &series, 1).unwrap();
    assert_eq!(out, "testB{{1,2}}");
}

#[test]
fn substitute_labeled_co_expansion() {
    let series = first_series("test{{my:A,B}}{{my}}").unwrap().unwrap();
    let out = substitute("test{{my:A,B}}{{my}}", &series, 0).unwrap();
    assert_eq!(out, "testA{{my}}");
}

#[test]
fn substitute_labeled_mismatch_is_an_error() {
    let target = Series::labeled("my", vec!["A".into(), "B".into()]);
    let err = substitute("{{my:1,2,3}}", &target, 0).unwrap_err();
    assert!(matches!(err, TemplateError::SeriesMappingMismatch(_)));
}