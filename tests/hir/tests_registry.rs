//! Registry snapshots and diffs built from real extractions.

use archgen::hir::{ArtifactRegistry, CallGraph, GeneratorOptions, diff, extract_file};
use archgen::syntax::{ProjectMember, SourceFile};
use rstest::rstest;

use crate::helpers::fixtures::*;

/// Commit every file of `member` into a fresh registry.
fn snapshot(member: &ProjectMember) -> ArtifactRegistry {
    snapshot_in(member, 1)
}

/// Like [`snapshot`], stamping artifacts with the `generation`-th generation.
fn snapshot_in(member: &ProjectMember, generation: u64) -> ArtifactRegistry {
    let calls = CallGraph::build(member);
    let options = GeneratorOptions::default();
    let mut registry = ArtifactRegistry::new();
    for _ in 0..generation {
        registry.begin_generation();
    }
    for file in member.files.values() {
        let extraction = extract_file(&member.name, file, &member.symbols, &calls, &options);
        for component in extraction.components {
            registry.upsert(&member.name, &file.path, component).unwrap();
        }
    }
    registry
}

fn empty() -> Vec<SourceFile> {
    vec![]
}

fn greeting() -> Vec<SourceFile> {
    vec![greeting_file()]
}

fn greeting_with_post() -> Vec<SourceFile> {
    vec![greeting_file_with_post()]
}

fn split_across_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new("listeners.bal", vec![listener("l1", "8080", 1)]),
        SourceFile::new(
            "main.bal",
            vec![service("/s1", "l1", vec![resource("get", "greeting", vec![], 4, 6)], 3, 7)],
        ),
    ]
}

fn with_types() -> Vec<SourceFile> {
    vec![
        greeting_file(),
        SourceFile::new("types.bal", vec![record("Order", &[("id", "int")], 1)]),
    ]
}

#[rstest]
#[case::from_empty(empty(), greeting())]
#[case::to_empty(greeting(), empty())]
#[case::method_added(greeting(), greeting_with_post())]
#[case::listener_moved_out(greeting(), split_across_files())]
#[case::listener_moved_back(split_across_files(), greeting())]
#[case::type_file_added(greeting_with_post(), with_types())]
fn test_diff_applies_to_previous_snapshot(
    #[case] before: Vec<SourceFile>,
    #[case] after: Vec<SourceFile>,
) {
    let prev = snapshot(&member_with(before));
    let curr = snapshot(&member_with(after));
    let delta = diff(&prev, &curr);

    let added = delta.added_ids();
    assert!(delta.removed.iter().all(|id| !added.contains(id)));

    let mut replay = prev.clone();
    replay.apply(&delta);
    assert_eq!(replay, curr);
}

#[test]
fn test_second_resource_updates_only_the_service() {
    let prev = snapshot(&member_with(greeting()));
    let curr = snapshot(&member_with(greeting_with_post()));
    let delta = diff(&prev, &curr);

    assert!(delta.added.is_empty());
    assert!(delta.removed.is_empty());
    let updated: Vec<&str> = delta.updated_ids().into_iter().map(|id| id.as_ref()).collect();
    assert_eq!(updated, vec!["service:app:/s1"]);
}

#[test]
fn test_moved_listener_is_an_update() {
    let prev = snapshot(&member_with(greeting()));
    let curr = snapshot(&member_with(split_across_files()));
    let delta = diff(&prev, &curr);

    let updated: Vec<&str> = delta.updated_ids().into_iter().map(|id| id.as_ref()).collect();
    assert!(updated.contains(&"listener:app:l1"));
    assert!(delta.removed.is_empty());
    assert_eq!(
        curr.get("listener:app:l1").unwrap().file().as_ref(),
        "listeners.bal"
    );
}

#[test]
fn test_unchanged_project_has_empty_diff() {
    let first = snapshot(&member_with(with_types()));
    let second = snapshot(&member_with(with_types()));
    assert_eq!(first, second);
    assert!(diff(&first, &second).is_empty());
}

#[test]
fn test_diff_round_trips_across_generations() {
    let member = member_with(greeting());
    let prev = snapshot_in(&member, 1);
    let curr = snapshot_in(&member, 2);
    assert_ne!(
        prev.get("service:app:/s1").unwrap().last_modified,
        curr.get("service:app:/s1").unwrap().last_modified
    );

    let delta = diff(&prev, &curr);
    assert!(delta.is_empty());

    let mut replay = prev.clone();
    replay.apply(&delta);
    assert_eq!(replay, curr);
    assert_eq!(
        replay.get("service:app:/s1"),
        curr.get("service:app:/s1")
    );
}
