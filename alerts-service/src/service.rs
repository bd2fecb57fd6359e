use crate::models::{Alert, AlertProvider, AlertType, AlertUpdate};
use chrono::Utc;
use document_store::{Collection, Store};
use error_common::{require, ClinicError, Result};
use logger_redacted::redacted_info;
use tracing::{info, instrument, warn};

/// Alerts for patients, persisted in the `alerts` collection
#[derive(Clone)]
pub struct AlertService {
    alerts: Collection<Alert>,
}

impl AlertService {
    pub fn new(store: &Store) -> Self {
        Self {
            alerts: store.collection::<Alert>(),
        }
    }

    /// # Errors
    ///
    /// `Validation` if `id` or `patient.id` is missing, `Duplicate` if the id
    /// is taken.
    #[instrument(skip(self, alert), fields(alert_id = %alert.id, alert_type = ?alert.alert_type))]
    pub async fn create(&self, alert: Alert) -> Result<Alert> {
        if alert.id.trim().is_empty() || alert.patient.id.trim().is_empty() {
            warn!("Rejected alert with missing fields");
            return Err(ClinicError::validation("Missing required alert fields"));
        }

        let stored = self.alerts.insert(alert).await?;
        redacted_info!("Alert created for patient {}: {}", stored.patient.email, stored.summary());
        Ok(stored)
    }

    /// # Errors
    ///
    /// `NotFound` if the alert does not exist.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: AlertUpdate) -> Result<Alert> {
        require(id, "Alert ID is required")?;
        self.alerts
            .update_with(id, |alert| {
                let AlertUpdate {
                    data,
                    action_required,
                    tags,
                    assigned_provider,
                    occurrences,
                } = update;

                if let Some(data) = data {
                    alert.data = data;
                }
                if let Some(action_required) = action_required {
                    alert.action_required = action_required;
                }
                if let Some(tags) = tags {
                    alert.tags = tags;
                }
                if let Some(provider) = assigned_provider {
                    alert.assigned_provider = provider;
                }
                if let Some(occurrences) = occurrences {
                    alert.occurrences = occurrences;
                }
                Ok(())
            })
            .await
    }

    /// # Errors
    ///
    /// `NotFound` if the alert does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Alert> {
        require(id, "Alert ID is required")?;
        self.alerts.delete(id).await
    }

    /// Mark an alert resolved by `resolving_provider_id`
    ///
    /// The assigned provider is recorded as the resolver when the ids match,
    /// otherwise a provider carrying only the given id.
    ///
    /// # Errors
    ///
    /// `Validation` for empty ids, `NotFound` if the alert does not exist.
    #[instrument(skip(self))]
    pub async fn resolve(&self, id: &str, resolving_provider_id: &str) -> Result<Alert> {
        require(id, "Alert ID is required")?;
        require(resolving_provider_id, "Resolving provider ID is required")?;

        let resolved = self
            .alerts
            .update_with(id, |alert| {
                let resolver = if alert.assigned_provider.id == resolving_provider_id {
                    alert.assigned_provider.clone()
                } else {
                    AlertProvider::stub(resolving_provider_id)
                };
                alert.resolved_date = Some(Utc::now());
                alert.resolving_provider = Some(resolver);
                alert.action_required = false;
                Ok(())
            })
            .await?;

        info!(resolving_provider_id, "Alert resolved");
        Ok(resolved)
    }

    /// Undo a resolution; the alert requires action again
    ///
    /// # Errors
    ///
    /// `NotFound` if the alert does not exist.
    #[instrument(skip(self))]
    pub async fn reopen(&self, id: &str) -> Result<Alert> {
        require(id, "Alert ID is required")?;

        let reopened = self
            .alerts
            .update_with(id, |alert| {
                alert.resolved_date = None;
                alert.resolving_provider = None;
                alert.action_required = true;
                Ok(())
            })
            .await?;

        info!("Alert reopened");
        Ok(reopened)
    }

    pub async fn get_all(&self) -> Result<Vec<Alert>> {
        self.alerts.all().await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Alert>> {
        require(id, "Alert ID is required")?;
        self.alerts.find(id).await
    }

    pub async fn get_by_patient_id(&self, patient_id: &str) -> Result<Vec<Alert>> {
        require(patient_id, "Patient ID is required")?;
        self.alerts.filter(|a| a.patient.id == patient_id).await
    }

    pub async fn get_by_type(&self, alert_type: AlertType) -> Result<Vec<Alert>> {
        self.alerts.filter(|a| a.alert_type == alert_type).await
    }

    /// Alerts flagged for action and not yet resolved
    pub async fn get_requiring_action(&self) -> Result<Vec<Alert>> {
        self.alerts.filter(Alert::requires_action).await
    }

    pub async fn get_resolved(&self) -> Result<Vec<Alert>> {
        self.alerts.filter(Alert::is_resolved).await
    }

    pub async fn get_by_assigned_provider(&self, provider_id: &str) -> Result<Vec<Alert>> {
        require(provider_id, "Provider ID is required")?;
        self.alerts
            .filter(|a| a.assigned_provider.id == provider_id)
            .await
    }

    pub async fn get_by_tag(&self, tag_name: &str) -> Result<Vec<Alert>> {
        require(tag_name, "Tag name is required")?;
        self.alerts
            .filter(|a| a.tags.iter().any(|t| t.name == tag_name))
            .await
    }
}
