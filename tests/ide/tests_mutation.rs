//! `addField` and `modifyListener` through `DesignModelHost`.

use archgen::base::{Position, Span};
use archgen::hir::{Severity, codes};
use archgen::ide::{
    CodeLocation, DesignModelHost, FieldSpec, HostError, ListenerArg, ListenerSpec,
    MutationOutcome, TextEdit,
};
use archgen::syntax::{SourceFile, TypeDesc};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use crate::helpers::fixtures::*;

fn opened(files: Vec<SourceFile>) -> DesignModelHost {
    let host = host_for(project_with(files));
    host.notify_artifacts_changed(PROJECT, &CancellationToken::new())
        .unwrap();
    host
}

fn with_order_type() -> Vec<SourceFile> {
    vec![
        greeting_file(),
        SourceFile::new("types.bal", vec![record("Order", &[("id", "int")], 1)]),
    ]
}

fn http_listener(name: &str, port: &str) -> ListenerSpec {
    ListenerSpec::new(name, &TypeDesc::qualified("http", "Listener"))
        .with_arg(ListenerArg::positional(port))
}

// =============================================================================
// ADD FIELD
// =============================================================================

#[test]
fn test_add_field_to_record() {
    let host = opened(with_order_type());
    let outcome = host
        .add_field(
            "types.bal",
            &FieldSpec::new("note", "string").with_optional(true),
            &CodeLocation::from_coords(1, 0, 3, 1),
        )
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert!(updated.diagnostics.is_empty());
    assert_eq!(updated.artifact.id.as_ref(), "entity:app:Order");
    assert_eq!(
        updated.text_edits.get("types.bal").unwrap(),
        &vec![TextEdit::insert(Position::new(2, 20), "\n    string note?;")]
    );

    let entity = updated.artifact.payload.as_entity().unwrap();
    let names: Vec<&str> = entity.fields.iter().map(|f| f.name.as_ref()).collect();
    assert_eq!(names, vec!["id", "note"]);
    assert!(entity.fields[1].optional);

    let notification = host
        .notify_artifacts_changed(PROJECT, &CancellationToken::new())
        .unwrap();
    assert_eq!(
        notification.updated_ids().into_iter().collect::<Vec<_>>(),
        vec!["entity:app:Order"]
    );
}

#[test]
fn test_add_field_to_service() {
    let host = opened(vec![greeting_file()]);
    let spec = FieldSpec::new("db", "http:Client").with_readonly(true);
    let outcome = host
        .add_field("main.bal", &spec, &CodeLocation::from_coords(3, 0, 7, 1))
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert_eq!(updated.artifact.id.as_ref(), "service:app:/s1");
    assert_eq!(
        updated.text_edits.get("main.bal").unwrap()[0],
        TextEdit::insert(Position::new(3, 31), "\n    final http:Client db;")
    );

    let service = updated.artifact.payload.as_service().unwrap();
    assert_eq!(service.fields.len(), 1);
    assert_eq!(service.fields[0].name.as_ref(), "db");
    assert_eq!(service.fields[0].type_signature.as_deref(), Some("http:Client"));
}

#[test]
fn test_add_field_to_class_references_local_type() {
    let mut files = with_order_type();
    files.push(SourceFile::new("repo.bal", vec![class("Repo", vec![], 1, 2)]));
    let host = opened(files);

    let outcome = host
        .add_field(
            "repo.bal",
            &FieldSpec::new("last", "Order"),
            &CodeLocation::from_coords(1, 0, 2, 1),
        )
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert_eq!(updated.artifact.id.as_ref(), "entity:app:Repo");
    assert_eq!(
        updated.text_edits.get("repo.bal").unwrap()[0],
        TextEdit::insert(Position::new(1, 16), "\n    Order last;")
    );
    let entity = updated.artifact.payload.as_entity().unwrap();
    assert_eq!(entity.fields[0].reference.as_deref(), Some("entity:app:Order"));
}

#[test]
fn test_add_field_moves_the_service_body() {
    let host = opened(vec![greeting_file()]);
    let outcome = host
        .add_field(
            "main.bal",
            &FieldSpec::new("count", "int"),
            &CodeLocation::from_coords(3, 0, 7, 1),
        )
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert_eq!(
        updated.text_edits.get("main.bal").unwrap()[0],
        TextEdit::insert(Position::new(3, 31), "\n    int count;")
    );
    let service = updated.artifact.payload.as_service().unwrap();
    let resource = &service.resource_functions[0];
    assert_eq!(resource.location.span(), Span::from_coords(5, 0, 7, 1));
    assert_eq!(resource.location.start_offset(), 415);
    assert_eq!(service.location.span(), Span::from_coords(3, 0, 8, 1));
    assert_eq!(service.location.end_offset(), 716);
}

#[test]
fn test_consecutive_edits_to_one_file() {
    let host = opened(vec![SourceFile::new(
        "types.bal",
        vec![
            record("Order", &[("id", "int")], 1),
            record("Item", &[("sku", "string")], 5),
        ],
    )]);
    let spec = FieldSpec::new("note", "string");

    host.add_field("types.bal", &spec, &CodeLocation::from_coords(1, 0, 3, 1))
        .unwrap()
        .updated()
        .unwrap();

    // Item moved down one line
    let item = host.artifact(PROJECT, "entity:app:Item").unwrap();
    assert_eq!(item.payload.location().span(), Span::from_coords(6, 0, 8, 1));

    let outcome = host
        .add_field("types.bal", &spec, &CodeLocation::from_coords(6, 0, 8, 1))
        .unwrap();
    let updated = outcome.updated().unwrap();
    assert_eq!(updated.artifact.id.as_ref(), "entity:app:Item");
    assert_eq!(
        updated.text_edits.get("types.bal").unwrap(),
        &vec![TextEdit::insert(Position::new(7, 20), "\n    string note;")]
    );
    let names: Vec<&str> = updated
        .artifact
        .payload
        .as_entity()
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.as_ref())
        .collect();
    assert_eq!(names, vec!["sku", "note"]);
}

#[rstest]
#[case::listener(CodeLocation::from_coords(1, 0, 1, 40))]
#[case::nothing_there(CodeLocation::from_coords(40, 0, 41, 0))]
fn test_add_field_rejects_other_targets(#[case] at: CodeLocation) {
    let host = opened(vec![greeting_file()]);
    let before = host.artifacts(PROJECT, &CancellationToken::new()).unwrap();

    let outcome = host
        .add_field("main.bal", &FieldSpec::new("x", "int"), &at)
        .unwrap();

    let MutationOutcome::Rejected(diagnostics) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].code.as_ref(), codes::INVALID_MUTATION_TARGET);
    assert_eq!(host.artifacts(PROJECT, &CancellationToken::new()).unwrap(), before);
}

#[test]
fn test_add_field_to_unknown_file() {
    let host = opened(vec![greeting_file()]);
    let err = host
        .add_field(
            "missing.bal",
            &FieldSpec::new("x", "int"),
            &CodeLocation::from_coords(0, 0, 0, 1),
        )
        .unwrap_err();
    assert_eq!(err, HostError::file_not_found("missing.bal"));
}

// =============================================================================
// MODIFY LISTENER
// =============================================================================

#[test]
fn test_modify_listener_port() {
    let host = opened(vec![greeting_file()]);
    let outcome = host
        .modify_listener(
            "main.bal",
            &http_listener("l1", "9090"),
            &CodeLocation::from_coords(1, 0, 1, 40),
        )
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert_eq!(updated.artifact.id.as_ref(), "listener:app:l1");
    assert_eq!(
        updated.text_edits.get("main.bal").unwrap(),
        &vec![TextEdit::replace(
            Span::from_coords(1, 0, 1, 40),
            "listener http:Listener l1 = new (9090);"
        )]
    );
    let listener = updated.artifact.payload.as_listener().unwrap();
    assert_eq!(listener.port, Some(9090));

    // The declaration got one byte shorter, so the service below moved
    let notification = host
        .notify_artifacts_changed(PROJECT, &CancellationToken::new())
        .unwrap();
    assert_eq!(
        notification.updated_ids().into_iter().collect::<Vec<_>>(),
        vec!["listener:app:l1", "service:app:/s1"]
    );
    let service = host.artifact(PROJECT, "service:app:/s1").unwrap();
    assert_eq!(service.payload.location().start_offset(), 299);
}

#[test]
fn test_renaming_a_listener_replaces_its_artifact() {
    let host = opened(vec![greeting_file()]);
    let outcome = host
        .modify_listener(
            "main.bal",
            &http_listener("api", "8080"),
            &CodeLocation::from_coords(1, 0, 1, 40),
        )
        .unwrap();

    let updated = outcome.updated().unwrap();
    assert_eq!(updated.artifact.id.as_ref(), "listener:app:api");
    // The service still names the old listener
    assert!(
        updated
            .diagnostics
            .iter()
            .any(|d| d.code.as_ref() == codes::UNRESOLVED_LISTENER)
    );
    assert!(host.artifact(PROJECT, "listener:app:l1").is_none());

    let notification = host
        .notify_artifacts_changed(PROJECT, &CancellationToken::new())
        .unwrap();
    assert_eq!(
        notification.removed_ids().into_iter().collect::<Vec<_>>(),
        vec!["listener:app:l1"]
    );
    assert!(notification.added_ids().contains("listener:app:api"));
}

#[test]
fn test_modify_listener_on_a_service_is_an_error() {
    let host = opened(vec![greeting_file()]);
    let before = host.artifacts(PROJECT, &CancellationToken::new()).unwrap();

    let outcome = host
        .modify_listener(
            "main.bal",
            &http_listener("l1", "9090"),
            &CodeLocation::from_coords(3, 0, 7, 1),
        )
        .unwrap();

    assert!(outcome.updated().is_none());
    let diagnostics = outcome.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].is_error());
    assert_eq!(diagnostics[0].code.as_ref(), codes::INVALID_MUTATION_TARGET);
    assert_eq!(host.artifacts(PROJECT, &CancellationToken::new()).unwrap(), before);
}
