use crate::models::{PaymentMethod, PaymentMethodType, PaymentMethodUpdate};
use document_store::{clear_flag_siblings, Collection, Store};
use error_common::{require, ClinicError, Result};
use logger_redacted::redacted_info;
use tracing::{debug, instrument, warn};

/// Stored payment instruments, at most one default per patient
#[derive(Clone)]
pub struct PaymentMethodRegistry {
    methods: Collection<PaymentMethod>,
}

fn validate_field_groups(method: &PaymentMethod) -> Result<()> {
    match method.method_type {
        PaymentMethodType::Card if method.has_bank_fields() => Err(ClinicError::validation(
            "A CARD payment method must not carry bank account fields",
        )),
        PaymentMethodType::BankAccount if method.has_card_fields() => Err(ClinicError::validation(
            "A BANK_ACCOUNT payment method must not carry card fields",
        )),
        _ => Ok(()),
    }
}

fn id_of(method: &PaymentMethod) -> &str {
    &method.id
}

impl PaymentMethodRegistry {
    pub fn new(store: &Store) -> Self {
        Self {
            methods: store.collection::<PaymentMethod>(),
        }
    }

    /// Store a new payment method
    ///
    /// When the new method is the default, every existing default of the
    /// same patient is cleared in the same collection write.
    ///
    /// # Errors
    ///
    /// `Validation` if `id`, `patientId` or `description` is missing or the
    /// field groups do not match `type`, `Duplicate` if the id is taken.
    #[instrument(skip(self, method), fields(method_id = %method.id, patient_id = %method.patient_id))]
    pub async fn create(&self, method: PaymentMethod) -> Result<PaymentMethod> {
        if method.id.trim().is_empty()
            || method.patient_id.trim().is_empty()
            || method.description.trim().is_empty()
        {
            warn!("Rejected payment method with missing fields");
            return Err(ClinicError::validation("Missing required payment method fields"));
        }
        validate_field_groups(&method)?;

        let stored = self
            .methods
            .mutate(|methods| {
                if methods.iter().any(|m| m.id == method.id) {
                    return Err(ClinicError::duplicate(format!(
                        "Payment method with ID '{}' already exists",
                        method.id
                    )));
                }
                if method.is_default {
                    let cleared = clear_flag_siblings(methods, &method.patient_id, None, id_of);
                    debug!(cleared, "Cleared previous default");
                }
                methods.push(method.clone());
                Ok(method)
            })
            .await?;

        redacted_info!("Payment method created: {}", stored.description);
        Ok(stored)
    }

    /// Merge the given fields into a payment method
    ///
    /// # Errors
    ///
    /// `NotFound` if the method does not exist, `Validation` if the merged
    /// method has an empty description or mismatched field groups.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: PaymentMethodUpdate) -> Result<PaymentMethod> {
        require(id, "Payment method ID is required")?;

        let updated = self
            .methods
            .mutate(|methods| {
                let index = methods
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or_else(|| Collection::<PaymentMethod>::not_found(id))?;
                let mut merged = methods
                    .get(index)
                    .cloned()
                    .ok_or_else(|| Collection::<PaymentMethod>::not_found(id))?;
                apply_update(&mut merged, update);

                require(&merged.description, "Payment method description must not be empty")?;
                validate_field_groups(&merged)?;

                if merged.is_default {
                    clear_flag_siblings(methods, &merged.patient_id, Some(id), id_of);
                }
                if let Some(slot) = methods.get_mut(index) {
                    *slot = merged.clone();
                }
                Ok(merged)
            })
            .await?;

        redacted_info!("Payment method updated: {}", updated.description);
        Ok(updated)
    }

    /// Make `id` the only default among its patient's methods
    ///
    /// # Errors
    ///
    /// `NotFound` if the method does not exist.
    #[instrument(skip(self))]
    pub async fn set_default(&self, id: &str) -> Result<PaymentMethod> {
        require(id, "Payment method ID is required")?;

        self.methods
            .mutate(|methods| {
                let patient_id = methods
                    .iter()
                    .find(|m| m.id == id)
                    .map(|m| m.patient_id.clone())
                    .ok_or_else(|| Collection::<PaymentMethod>::not_found(id))?;

                clear_flag_siblings(methods, &patient_id, Some(id), id_of);
                let method = methods
                    .iter_mut()
                    .find(|m| m.id == id)
                    .ok_or_else(|| Collection::<PaymentMethod>::not_found(id))?;
                method.is_default = true;
                Ok(method.clone())
            })
            .await
    }

    /// The patient's default method; `None` when none is configured
    pub async fn get_default(&self, patient_id: &str) -> Result<Option<PaymentMethod>> {
        require(patient_id, "Patient ID is required")?;
        Ok(self
            .methods
            .all()
            .await?
            .into_iter()
            .find(|m| m.patient_id == patient_id && m.is_default))
    }

    pub async fn get_all(&self) -> Result<Vec<PaymentMethod>> {
        self.methods.all().await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<PaymentMethod>> {
        require(id, "Payment method ID is required")?;
        self.methods.find(id).await
    }

    pub async fn get_by_patient_id(&self, patient_id: &str) -> Result<Vec<PaymentMethod>> {
        require(patient_id, "Patient ID is required")?;
        self.methods.filter(|m| m.patient_id == patient_id).await
    }

    /// # Errors
    ///
    /// `NotFound` if the method does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<PaymentMethod> {
        require(id, "Payment method ID is required")?;
        self.methods.delete(id).await
    }
}

fn apply_update(method: &mut PaymentMethod, update: PaymentMethodUpdate) {
    let PaymentMethodUpdate {
        brand,
        last4,
        exp_month,
        exp_year,
        account_holder_type,
        account_number_last4,
        bank_name,
        routing_number,
        description,
        method_type,
        is_default,
    } = update;

    if let Some(brand) = brand {
        method.brand = brand;
    }
    if let Some(last4) = last4 {
        method.last4 = last4;
    }
    if let Some(exp_month) = exp_month {
        method.exp_month = exp_month;
    }
    if let Some(exp_year) = exp_year {
        method.exp_year = exp_year;
    }
    if let Some(account_holder_type) = account_holder_type {
        method.account_holder_type = account_holder_type;
    }
    if let Some(account_number_last4) = account_number_last4 {
        method.account_number_last4 = account_number_last4;
    }
    if let Some(bank_name) = bank_name {
        method.bank_name = bank_name;
    }
    if let Some(routing_number) = routing_number {
        method.routing_number = routing_number;
    }
    if let Some(description) = description {
        method.description = description;
    }
    if let Some(method_type) = method_type {
        method.method_type = method_type;
    }
    if let Some(is_default) = is_default {
        method.is_default = is_default;
    }
}
