mod common;

use std::sync::Arc;

use common::{params, workbench_with, RecordingSink};
use sampling_workbench::sampling_protocol::RequestStatus;
use sampling_workbench::{
    HumanResponse, RegistryEvent, ResolutionMode, Workbench, WorkbenchConfig, WorkbenchError,
};

fn manual_workbench() -> Workbench {
    workbench_with(
        WorkbenchConfig::default(),
        None,
        Arc::new(RecordingSink::default()),
    )
}

async fn completed_request(wb: &Workbench, answer: &str) -> String {
    let request = wb.create_request("srv-1", params("Say hello"), None).await.unwrap();
    wb.approve_and_process(&request.id, ResolutionMode::Human(HumanResponse::new(answer)))
        .await
        .unwrap();
    request.id
}

#[tokio::test]
async fn test_replay_template_onto_pending_request() {
    let wb = manual_workbench();
    let source_id = completed_request(&wb, "Hello there!").await;
    let template = wb.save_as_template(&source_id, "greeting").await.unwrap();
    assert_eq!(template.use_count, 0);
    assert!(template.last_used.is_none());

    let target = wb.create_request("srv-2", params("Greet me"), None).await.unwrap();
    let replayed = wb.apply_template(&target.id, &template.id).await.unwrap();

    assert_eq!(replayed.status, RequestStatus::Completed);
    assert_eq!(replayed.response, Some(template.response.clone()));
    assert!(replayed.error.is_none());

    let stored = wb.get_template(&template.id).await.unwrap();
    assert_eq!(stored.use_count, 1);
    assert!(stored.last_used.is_some());

    let stats = wb.stats();
    assert_eq!(stats.replayed_requests, 1);
    assert_eq!(stats.successful_requests, 2);
}

#[tokio::test]
async fn test_templates_survive_source_deletion() {
    let wb = manual_workbench();
    let source_id = completed_request(&wb, "Captured answer").await;

    let first = wb.save_as_template(&source_id, "first").await.unwrap();
    let second = wb.save_as_template(&source_id, "second").await.unwrap();
    assert_ne!(first.id, second.id);

    wb.delete_request(&source_id).await.unwrap();
    assert!(wb.get_request(&source_id).await.is_none());

    let templates = wb.list_templates().await;
    assert_eq!(templates.len(), 2);
    for template in templates {
        assert_eq!(template.source_request_id, source_id);
        assert_eq!(template.response.content.as_text(), Some("Captured answer"));
    }
}

#[tokio::test]
async fn test_save_requires_completed_request() {
    let wb = manual_workbench();
    let pending = wb.create_request("srv-1", params("hi"), None).await.unwrap();

    assert!(matches!(
        wb.save_as_template(&pending.id, "nope").await,
        Err(WorkbenchError::InvalidTransition { .. })
    ));
    assert!(matches!(
        wb.save_as_template("missing", "nope").await,
        Err(WorkbenchError::RequestNotFound(_))
    ));

    let source_id = completed_request(&wb, "ok").await;
    assert!(matches!(
        wb.save_as_template(&source_id, "  ").await,
        Err(WorkbenchError::Validation(_))
    ));
    assert!(wb.list_templates().await.is_empty());
}

#[tokio::test]
async fn test_apply_requires_pending_target_and_known_template() {
    let wb = manual_workbench();
    let source_id = completed_request(&wb, "ok").await;
    let template = wb.save_as_template(&source_id, "ok").await.unwrap();

    let target = wb.create_request("srv-1", params("hi"), None).await.unwrap();
    assert!(matches!(
        wb.apply_template(&target.id, "missing").await,
        Err(WorkbenchError::TemplateNotFound(_))
    ));
    assert!(matches!(
        wb.apply_template(&source_id, &template.id).await,
        Err(WorkbenchError::InvalidTransition { .. })
    ));
    assert!(wb.get_request(&target.id).await.unwrap().is_pending());
    assert_eq!(wb.get_template(&template.id).await.unwrap().use_count, 0);
}

#[tokio::test]
async fn test_delete_template() {
    let wb = manual_workbench();
    let source_id = completed_request(&wb, "ok").await;
    let template = wb.save_as_template(&source_id, "ok").await.unwrap();
    let mut events = wb.subscribe();

    wb.delete_template(&template.id).await.unwrap();
    assert!(wb.list_templates().await.is_empty());
    assert!(matches!(
        wb.delete_template(&template.id).await,
        Err(WorkbenchError::TemplateNotFound(_))
    ));

    match events.recv().await.unwrap() {
        RegistryEvent::TemplateDeleted { template_id } => assert_eq!(template_id, template.id),
        other => panic!("expected TemplateDeleted, got {:?}", other),
    }
}
