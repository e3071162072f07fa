// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn yaml(s: &str) -> Vec<Value> {
    serde_yaml::from_str(s).unwrap()
}

#[test]
fn bare_string_leaf_has_no_features() {
    let commands = generate_commands(&yaml("- echo Hello")).unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].text, "echo Hello");
    assert_eq!(commands[0].features, Features::default());
}

#[test]
fn mapping_leaf_decodes_features() {
    let commands = generate_commands(&yaml(
        "- echo hi:\n    name: greet\n    retries: 2\n    timeout: 5.5\n    background: true\n",
    ))
    .unwrap();
    assert_eq!(commands.len(), 1);
    let f = &commands[0].features;
    assert_eq!(f.name.as_deref(), Some("greet"));
    assert_eq!(f.retries, 2);
    assert_eq!(f.timeout, Some(5.5));
    assert!(f.background);
}

#[test]
fn unknown_keyword_is_an_error() {
    let err = generate_commands(&yaml("- echo hi:\n    bogus: true\n")).unwrap_err();
    assert!(matches!(err, TemplateError::UnknownKeyword(k) if k == "bogus"));
}

#[test]
fn string_valued_depends_on_is_whitespace_split() {
    let commands =
        generate_commands(&yaml("- echo hi:\n    depends_on: first second\n")).unwrap();
    assert_eq!(
        commands[0].features.depends_on,
        vec!["first".to_string(), "second".to_string()]
    );
}

#[test]
fn list_valued_depends_on_is_used_verbatim() {
    let commands =
        generate_commands(&yaml("- echo hi:\n    depends_on: [first, second]\n")).unwrap();
    assert_eq!(
        commands[0].features.depends_on,
        vec!["first".to_string(), "second".to_string()]
    );
}

#[test]
fn foreach_sequence_expands_in_order() {
    let commands = generate_commands(&yaml(
        "- - foreach: 'label:a,b'\n  - echo {{label}}\n",
    ))
    .unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, vec!["echo a", "echo b"]);
}

#[test]
fn nested_foreach_binds_independent_indices() {
    let commands = generate_commands(&yaml(
        "- - foreach: 'outer:x,y'\n  - - foreach: 'inner:1,2'\n    - echo {{outer}}{{inner}}\n",
    ))
    .unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, vec!["echo x1", "echo x2", "echo y1", "echo y2"]);
}

#[test]
fn reusing_a_parent_label_in_a_nested_foreach_is_an_error() {
    let err = generate_commands(&yaml(
        "- - foreach: 'label:a,b'\n  - - foreach: 'label:c,d'\n    - echo {{label}}\n",
    ))
    .unwrap_err();
    assert!(matches!(err, TemplateError::SeriesAlreadyDefined(l) if l == "label"));
}

#[test]
fn sequence_without_foreach_head_just_groups_its_elements() {
    let commands = generate_commands(&yaml("- - echo a\n  - echo b\n")).unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, vec!["echo a", "echo b"]);
}

#[test]
fn plain_group_nested_inside_a_foreach_reuses_the_bound_series() {
    let commands = generate_commands(&yaml(
        "- - foreach: 'label:a,b'\n  - - echo {{label}}\n    - echo other {{label}}\n",
    ))
    .unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(
        texts,
        vec!["echo a", "echo other a", "echo b", "echo other b"]
    );
}

#[test]
fn top_level_entries_after_a_sequence_still_run() {
    // Every top-level entry contributes its commands, including ones
    // that come after a nested sequence.
    let commands = generate_commands(&yaml(
        "- - foreach: 'label:a'\n  - echo {{label}}\n- echo after\n",
    ))
    .unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, vec!["echo a", "echo after"]);
}

#[parameterized(
    cross_product = {"echo test{{A,B}}{{1,2}}", &["testA1", "testA2", "testB1", "testB2"]},
    labeled_co_expansion = {"echo test{{my:A,B}}{{my}}", &["testAA", "testBB"]},
)]
fn series_in_command_text_expand(text: &str, expected: &[&str]) {
    let commands = generate_commands(&[Value::String(text.to_string())]).unwrap();
    let texts: Vec<_> = commands.iter().map(|c| c.text.clone()).collect();
    assert_eq!(texts, expected.to_vec());
}