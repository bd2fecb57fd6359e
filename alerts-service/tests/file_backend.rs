use alerts_service::*;
use chrono::Utc;
use document_store::{FileSystemStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn form_alert(id: &str) -> Alert {
    Alert {
        id: id.to_string(),
        alert_type: AlertType::FormSubmitted,
        data: AlertData::FormSubmitted {
            id: "form_1".to_string(),
            name: "Intake questionnaire".to_string(),
            patient: PersonRef {
                id: "p_1".to_string(),
                first_name: "Ana".to_string(),
                last_name: "Lopez".to_string(),
            },
            submitted_at: Utc::now(),
        },
        created_date: Utc::now(),
        action_required: true,
        resolved_date: None,
        tags: vec![],
        assigned_provider: AlertProvider::stub("dr_1"),
        resolving_provider: None,
        occurrences: 1,
        patient: AlertPatient {
            id: "p_1".to_string(),
            ..AlertPatient::default()
        },
    }
}

#[tokio::test]
async fn test_alerts_survive_a_new_store_handle() {
    let temp_dir = TempDir::new().unwrap();

    let store = Store::new(
        Arc::new(FileSystemStore::new(temp_dir.path())),
        Duration::from_secs(2),
    );
    let service = AlertService::new(&store);
    let created = service.create(form_alert("al_1")).await.unwrap();
    service.resolve("al_1", "dr_1").await.unwrap();

    let reopened_store = Store::new(
        Arc::new(FileSystemStore::new(temp_dir.path())),
        Duration::from_secs(2),
    );
    let service = AlertService::new(&reopened_store);
    let alert = service.get_by_id("al_1").await.unwrap().unwrap();

    assert_eq!(alert.data, created.data);
    assert!(alert.is_resolved());
    assert_eq!(alert.resolving_provider.map(|p| p.id).as_deref(), Some("dr_1"));
    assert!(temp_dir.path().join("alerts.json").exists());
}
