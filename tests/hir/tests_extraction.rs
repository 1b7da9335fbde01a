//! Whole-file extraction through the public API.

use std::sync::Arc;

use archgen::hir::{
    ArchitectureComponent, CallGraph, FileExtraction, GeneratorOptions, InteractionKind, Severity,
    codes, extract_file,
};
use archgen::syntax::{Expr, ModuleMember, ProjectMember, SourceFile, Stmt};
use rstest::rstest;

use crate::helpers::fixtures::*;

fn extract(member: &ProjectMember, path: &str) -> FileExtraction {
    extract_with(member, path, &GeneratorOptions::default())
}

fn extract_with(member: &ProjectMember, path: &str, options: &GeneratorOptions) -> FileExtraction {
    let calls = CallGraph::build(member);
    let file = member.file(path).unwrap();
    extract_file(&member.name, file, &member.symbols, &calls, options)
}

fn ids(extraction: &FileExtraction) -> Vec<&str> {
    extraction.components.iter().map(|c| c.id().as_ref()).collect()
}

fn call(function: &str, line: u32) -> Stmt {
    Stmt::Expr {
        expr: Expr::Call {
            callee: Box::new(name(function, line)),
            args: vec![],
            range: at(line),
        },
    }
}

// =============================================================================
// PARTIAL FAILURE
// =============================================================================

#[test]
fn test_one_malformed_service_among_ten() {
    let mut members = vec![listener("ep", "8080", 0)];
    for i in 0..10u32 {
        let start = 2 + i * 3;
        if i == 4 {
            members.push(detached_service("/broken", start, start + 1));
        } else {
            members.push(service(&format!("/s{}", i), "ep", vec![], start, start + 1));
        }
    }
    let member = member_with(vec![SourceFile::new("main.bal", members)]);
    let extraction = extract(&member, "main.bal");

    let services = extraction
        .components
        .iter()
        .filter_map(ArchitectureComponent::as_service)
        .count();
    assert_eq!(services, 9);

    let errors: Vec<_> = extraction
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code.as_ref(), codes::MALFORMED_CONSTRUCT);
    assert_eq!(errors[0].location.start.line, 14);
}

// =============================================================================
// ID STABILITY
// =============================================================================

#[test]
fn test_ids_survive_file_rename() {
    let before = member_with(vec![greeting_file()]);
    let mut renamed = greeting_file();
    renamed.path = Arc::from("api/greeting.bal");
    let after = member_with(vec![renamed]);

    let old = extract(&before, "main.bal");
    let new = extract(&after, "api/greeting.bal");
    assert_eq!(ids(&old), ids(&new));
    assert_eq!(ids(&old), vec!["listener:app:l1", "service:app:/s1"]);
}

#[test]
fn test_moving_a_declaration_only_moves_its_location() {
    let before = member_with(vec![greeting_file()]);
    let moved = SourceFile::new(
        "main.bal",
        vec![
            service("/s1", "l1", vec![resource("get", "greeting", vec![], 2, 4)], 1, 5),
            listener("l1", "8080", 20),
        ],
    );
    let after = member_with(vec![moved]);

    let old = extract(&before, "main.bal");
    let new = extract(&after, "main.bal");

    let old_listener = old.components.iter().find_map(ArchitectureComponent::as_listener).unwrap();
    let new_listener = new.components.iter().find_map(ArchitectureComponent::as_listener).unwrap();
    assert_eq!(old_listener.id, new_listener.id);
    assert_eq!(old_listener.port, new_listener.port);
    assert_ne!(old_listener.location, new_listener.location);
    assert_eq!(new_listener.location.start.line, 20);
}

#[test]
fn test_same_listener_in_two_files_is_discriminated() {
    let member = member_with(vec![
        SourceFile::new("a.bal", vec![listener("ep", "8080", 1)]),
        SourceFile::new("b.bal", vec![listener("ep", "9090", 1)]),
    ]);
    assert_eq!(ids(&extract(&member, "a.bal")), vec!["listener:app:ep"]);
    assert_eq!(ids(&extract(&member, "b.bal")), vec!["listener:app:ep@b.bal"]);
}

// =============================================================================
// CONNECTIONS
// =============================================================================

fn automation_file() -> SourceFile {
    SourceFile::new(
        "main.bal",
        vec![
            client_var("db", 1),
            function("store", vec![remote_call("db", 3), remote_call("db", 4)], 2, 5),
            function("main", vec![call("store", 7), call("store", 8)], 6, 9),
        ],
    )
}

#[test]
fn test_connections_propagate_through_module_functions() {
    let member = member_with(vec![automation_file()]);
    let extraction = extract(&member, "main.bal");

    let connections: Vec<_> = extraction
        .components
        .iter()
        .filter_map(ArchitectureComponent::as_connection)
        .collect();
    assert_eq!(connections.len(), 3);

    // The declaration itself comes first, without a caller
    let declared = connections[0];
    assert_eq!(declared.id.as_ref(), "connection:app:db");
    assert_eq!(declared.source, None);
    assert_eq!(declared.target.id.as_ref(), "client:app:db");
    assert_eq!(declared.interaction, InteractionKind::Declared);
    assert_eq!(declared.call_count, 0);

    let from_main = connections
        .iter()
        .find(|c| c.source.as_deref() == Some("function:app:main"))
        .unwrap();
    assert_eq!(from_main.id.as_ref(), "connection:function:app:main->client:app:db");
    assert_eq!(from_main.target.id.as_ref(), "client:app:db");
    assert_eq!(from_main.interaction, InteractionKind::RemoteCall);
    // Two calls that each reach two uses
    assert_eq!(from_main.call_count, 4);
    assert_eq!(from_main.location.start.line, 7);

    let from_store = connections
        .iter()
        .find(|c| c.source.as_deref() == Some("function:app:store"))
        .unwrap();
    assert_eq!(from_store.call_count, 2);
}

#[rstest]
#[case(true, 3)]
#[case(false, 2)]
fn test_following_calls_is_configurable(#[case] follow: bool, #[case] expected: usize) {
    let member = member_with(vec![automation_file()]);
    let options = GeneratorOptions {
        follow_function_calls: follow,
        ..Default::default()
    };
    let extraction = extract_with(&member, "main.bal", &options);
    let connections = extraction
        .components
        .iter()
        .filter(|c| c.as_connection().is_some())
        .count();
    assert_eq!(connections, expected);
}

#[test]
fn test_unknown_member_is_reported_and_skipped() {
    let member = member_with(vec![SourceFile::new(
        "main.bal",
        vec![
            ModuleMember::Unknown { range: at(1) },
            listener("ep", "8080", 2),
        ],
    )]);
    let extraction = extract(&member, "main.bal");
    assert_eq!(ids(&extraction), vec!["listener:app:ep"]);
    assert_eq!(extraction.diagnostics.len(), 1);
    assert!(extraction.diagnostics[0].is_error());
}
