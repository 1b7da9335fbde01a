//! Model generation and change notification through `DesignModelHost`.

use std::sync::Arc;

use archgen::hir::ListenerRef;
use archgen::ide::{CodeLocation, FieldSpec, HostError};
use archgen::syntax::SourceFile;
use tokio_util::sync::CancellationToken;

use crate::helpers::fixtures::*;

fn token() -> CancellationToken {
    CancellationToken::new()
}

// =============================================================================
// GENERATE MODEL
// =============================================================================

#[test]
fn test_generate_model_for_listener_and_service() {
    let host = host_for(project_with(vec![greeting_file()]));
    let response = host.generate_model(PROJECT, &token()).unwrap();

    assert!(response.diagnostics.is_empty());
    assert_eq!(response.ids(), vec!["listener:app:l1", "service:app:/s1"]);

    let l1 = response.component("listener:app:l1").unwrap().as_listener().unwrap();
    assert_eq!(l1.port, Some(8080));

    let s1 = response.component("service:app:/s1").unwrap().as_service().unwrap();
    assert_eq!(
        s1.listeners,
        vec![ListenerRef::Resolved(Arc::from("listener:app:l1"))]
    );
    assert_eq!(s1.resource_functions.len(), 1);
}

#[test]
fn test_generate_model_is_idempotent() {
    let host = host_for(project_with(vec![greeting_file()]));
    let first = host.generate_model(PROJECT, &token()).unwrap();
    let second = host.generate_model(PROJECT, &token()).unwrap();
    assert_eq!(first, second);

    host.notify_artifacts_changed(PROJECT, &token()).unwrap();
    let again = host.notify_artifacts_changed(PROJECT, &token()).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_unknown_project_is_an_error() {
    let host = host_for(project_with(vec![greeting_file()]));
    let err = host.generate_model("file:///elsewhere", &token()).unwrap_err();
    assert_eq!(err, HostError::project_not_found("file:///elsewhere"));
    assert!(!host.is_open("file:///elsewhere"));
}

#[test]
fn test_model_serializes_to_json() {
    let host = host_for(project_with(vec![greeting_file()]));
    let response = host.generate_model(PROJECT, &token()).unwrap();
    let json = response.to_json().unwrap();

    assert_eq!(json["diagnostics"], serde_json::json!([]));
    assert_eq!(json["model"][0]["component"], "Listener");
    assert_eq!(json["model"][1]["id"], "service:app:/s1");
}

// =============================================================================
// CHANGE NOTIFICATIONS
// =============================================================================

#[test]
fn test_first_notification_adds_everything() {
    let host = host_for(project_with(vec![greeting_file()]));
    let notification = host.notify_artifacts_changed(PROJECT, &token()).unwrap();

    assert_eq!(notification.project_uri.as_ref(), PROJECT);
    assert_eq!(
        notification.added_ids().into_iter().collect::<Vec<_>>(),
        vec!["listener:app:l1", "service:app:/s1"]
    );
    assert!(notification.updated.is_empty());
    assert!(notification.removed.is_empty());
}

#[test]
fn test_second_resource_method_updates_only_the_service() {
    let host = host_for(project_with(vec![greeting_file()]));
    host.notify_artifacts_changed(PROJECT, &token()).unwrap();

    host.update_file(PROJECT, MEMBER, greeting_file_with_post()).unwrap();
    let notification = host.notify_artifacts_changed(PROJECT, &token()).unwrap();

    assert!(notification.added.is_empty());
    assert!(notification.removed.is_empty());
    assert_eq!(
        notification.updated_ids().into_iter().collect::<Vec<_>>(),
        vec!["service:app:/s1"]
    );
}

#[test]
fn test_deleting_the_file_removes_its_artifacts() {
    let host = host_for(project_with(vec![greeting_file()]));
    host.notify_artifacts_changed(PROJECT, &token()).unwrap();

    host.remove_file(PROJECT, "main.bal").unwrap();
    let notification = host.notify_artifacts_changed(PROJECT, &token()).unwrap();

    assert!(notification.added.is_empty());
    assert!(notification.updated.is_empty());
    assert_eq!(
        notification.removed_ids().into_iter().collect::<Vec<_>>(),
        vec!["listener:app:l1", "service:app:/s1"]
    );
    assert!(host.artifacts(PROJECT, &token()).unwrap().is_empty());
}

#[test]
fn test_new_file_in_unknown_member_is_rejected() {
    let host = host_for(project_with(vec![greeting_file()]));
    let err = host
        .update_file(PROJECT, "other", SourceFile::new("x.bal", vec![]))
        .unwrap_err();
    assert_eq!(err, HostError::MemberNotFound(Arc::from("other")));
}

// =============================================================================
// CANCELLATION AND LIFECYCLE
// =============================================================================

#[test]
fn test_cancelled_pass_leaves_registry_unchanged() {
    let host = host_for(project_with(vec![greeting_file()]));
    let before = host.artifacts(PROJECT, &token()).unwrap();

    host.update_file(PROJECT, MEMBER, greeting_file_with_post()).unwrap();
    let cancelled = token();
    cancelled.cancel();
    assert_eq!(
        host.generate_model(PROJECT, &cancelled).unwrap_err(),
        HostError::Cancelled
    );
    assert_eq!(host.artifacts(PROJECT, &token()).unwrap(), before);

    let service = host.artifact(PROJECT, "service:app:/s1").unwrap();
    assert_eq!(service.payload.as_service().unwrap().resource_functions.len(), 1);
}

#[test]
fn test_closing_discards_the_registry() {
    let host = host_for(project_with(vec![greeting_file()]));
    host.notify_artifacts_changed(PROJECT, &token()).unwrap();
    assert!(host.close_project(PROJECT));
    assert!(!host.is_open(PROJECT));
    assert!(!host.close_project(PROJECT));

    // Reopened on demand with nothing published yet
    let notification = host.notify_artifacts_changed(PROJECT, &token()).unwrap();
    assert_eq!(notification.added_ids().len(), 2);
}

#[test]
fn test_projects_are_isolated() {
    let other_uri = "file:///workspace/other";
    let greeting = project_with(vec![greeting_file()]);
    let mut other = project_with(vec![SourceFile::new(
        "main.bal",
        vec![listener("solo", "7070", 1)],
    )]);
    other.uri = Arc::from(other_uri);

    let host = archgen::ide::DesignModelHost::new(move |uri: &str| match uri {
        PROJECT => Some(greeting.clone()),
        u if u == other_uri => Some(other.clone()),
        _ => None,
    });

    let first = host.generate_model(PROJECT, &token()).unwrap();
    let second = host.generate_model(other_uri, &token()).unwrap();
    assert_eq!(first.model.len(), 2);
    assert_eq!(second.ids(), vec!["listener:app:solo"]);

    host.remove_file(other_uri, "main.bal").unwrap();
    host.generate_model(other_uri, &token()).unwrap();
    assert_eq!(host.generate_model(PROJECT, &token()).unwrap(), first);
}

// =============================================================================
// FILE ROUTING
// =============================================================================

fn order_file() -> SourceFile {
    SourceFile::new("types.bal", vec![record("Order", &[("id", "int")], 1)])
}

fn note_field() -> FieldSpec {
    FieldSpec::new("note", "string")
}

#[test]
fn test_path_requests_do_not_wait_on_other_projects() {
    let other_uri = "file:///workspace/other";
    let greeting = project_with(vec![greeting_file()]);
    let mut other = project_with(vec![order_file()]);
    other.uri = Arc::from(other_uri);

    let host = archgen::ide::DesignModelHost::new(move |uri: &str| match uri {
        PROJECT => Some(greeting.clone()),
        u if u == other_uri => Some(other.clone()),
        _ => None,
    });
    host.generate_model(PROJECT, &token()).unwrap();
    host.generate_model(other_uri, &token()).unwrap();

    let busy = host.open_project(PROJECT).unwrap();
    let _guard = busy.lock();
    let outcome = host
        .add_field("types.bal", &note_field(), &CodeLocation::from_coords(1, 0, 3, 1))
        .unwrap();
    assert_eq!(
        outcome.updated().unwrap().artifact.id.as_ref(),
        "entity:app:Order"
    );
}

#[test]
fn test_file_index_follows_updates_and_close() {
    let host = host_for(project_with(vec![greeting_file()]));
    let at = CodeLocation::from_coords(1, 0, 3, 1);

    host.update_file(PROJECT, MEMBER, order_file()).unwrap();
    host.generate_model(PROJECT, &token()).unwrap();
    assert!(host.add_field("types.bal", &note_field(), &at).unwrap().updated().is_some());

    host.remove_file(PROJECT, "types.bal").unwrap();
    assert_eq!(
        host.add_field("types.bal", &note_field(), &at).unwrap_err(),
        HostError::file_not_found("types.bal")
    );

    assert!(host.close_project(PROJECT));
    assert_eq!(
        host.add_field("main.bal", &note_field(), &at).unwrap_err(),
        HostError::file_not_found("main.bal")
    );
}
