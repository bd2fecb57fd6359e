use crate::models::{Adjustment, Charge, ChargeStatus, ChargeUpdate, Payment};
use crate::reporting::LedgerSummary;
use document_store::{Collection, Store};
use error_common::{require, ClinicError, Result};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// Sums that drive a charge's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTotals {
    pub paid: Decimal,
    pub adjusted: Decimal,
    pub outstanding: Decimal,
}

impl BalanceTotals {
    pub fn of(charge: &Charge) -> Self {
        let paid: Decimal = charge.payments.iter().map(|p| p.amount).sum();
        let adjusted: Decimal = charge.adjustments.iter().map(|a| a.amount).sum();
        let outstanding = (charge.total - adjusted - paid).max(Decimal::ZERO);
        Self {
            paid,
            adjusted,
            outstanding,
        }
    }
}

/// Recompute `totalOutstanding` and the payment-driven status
///
/// Outstanding is `max(0, total - Σadjustments - Σpayments)`. Status becomes
/// PAID when nothing is outstanding, PARTIALLY_PAID when something has been
/// paid, and UNPAID otherwise.
pub fn recompute_balance(charge: &mut Charge) -> BalanceTotals {
    let totals = BalanceTotals::of(charge);
    charge.total_outstanding = totals.outstanding;

    charge.status = if totals.outstanding.is_zero() {
        ChargeStatus::Paid
    } else if totals.paid > Decimal::ZERO {
        ChargeStatus::PartiallyPaid
    } else {
        ChargeStatus::Unpaid
    };
    totals
}

/// Like [`recompute_balance`], but CANCELLED and REFUNDED charges only get
/// their outstanding balance refreshed
fn rebalance(charge: &mut Charge) {
    if charge.status.is_manual() {
        charge.total_outstanding = BalanceTotals::of(charge).outstanding;
    } else {
        recompute_balance(charge);
    }
}

/// Charges for a clinic, persisted in the `charges` collection
#[derive(Clone)]
pub struct ChargeLedger {
    charges: Collection<Charge>,
}

impl ChargeLedger {
    pub fn new(store: &Store) -> Self {
        Self {
            charges: store.collection::<Charge>(),
        }
    }

    fn validate_new(charge: &Charge) -> Result<()> {
        if charge.id.trim().is_empty()
            || charge.description.trim().is_empty()
            || charge.patient.id.trim().is_empty()
        {
            return Err(ClinicError::validation("Missing required charge fields"));
        }
        if charge.total < Decimal::ZERO {
            return Err(ClinicError::validation("Charge total must not be negative"));
        }
        if charge.items.iter().any(|entry| entry.quantity == 0) {
            return Err(ClinicError::validation("Charge item quantity must be at least 1"));
        }
        Ok(())
    }

    /// Store a new charge
    ///
    /// The stored balance is recomputed from the charge's own payments and
    /// adjustments, so `totalOutstanding` is correct from the first write. A charge
    /// created as CANCELLED or REFUNDED keeps that status.
    ///
    /// # Errors
    ///
    /// `Validation` if `id`, `description` or `patient.id` is missing,
    /// `Duplicate` if the id is taken.
    #[instrument(skip(self, charge), fields(charge_id = %charge.id))]
    pub async fn create_charge(&self, mut charge: Charge) -> Result<Charge> {
        if let Err(e) = Self::validate_new(&charge) {
            warn!(error = %e, "Rejected charge");
            return Err(e);
        }

        rebalance(&mut charge);

        let stored = self.charges.insert(charge).await?;
        info!(patient_id = %stored.patient.id, total = %stored.total, "Charge created");
        Ok(stored)
    }

    /// Append a payment and recompute the balance
    ///
    /// # Errors
    ///
    /// `Validation` for an empty payment id or a non-positive amount,
    /// `NotFound` if the charge does not exist, `Duplicate` if a payment with
    /// the same id was already applied.
    #[instrument(skip(self, payment), fields(payment_id = %payment.id))]
    pub async fn apply_payment(&self, charge_id: &str, payment: Payment) -> Result<Charge> {
        require(charge_id, "Charge ID is required")?;
        require(&payment.id, "Payment ID is required")?;
        if payment.amount <= Decimal::ZERO {
            return Err(ClinicError::validation("Payment amount must be positive"));
        }

        let updated = self
            .charges
            .update_with(charge_id, |charge| {
                if charge.payments.iter().any(|p| p.id == payment.id) {
                    return Err(ClinicError::duplicate(format!(
                        "Payment '{}' was already applied to charge '{}'",
                        payment.id, charge.id
                    )));
                }
                charge.payments.push(payment);
                recompute_balance(charge);
                Ok(())
            })
            .await?;

        info!(
            outstanding = %updated.total_outstanding,
            status = ?updated.status,
            "Payment applied"
        );
        Ok(updated)
    }

    /// Append an adjustment and recompute the balance
    ///
    /// # Errors
    ///
    /// `Validation` for an empty adjustment id or an adjustment pointing at a
    /// different charge, `NotFound` if the charge does not exist, `Duplicate`
    /// if the adjustment id was already applied.
    #[instrument(skip(self, adjustment), fields(adjustment_id = %adjustment.id))]
    pub async fn apply_adjustment(&self, charge_id: &str, mut adjustment: Adjustment) -> Result<Charge> {
        require(charge_id, "Charge ID is required")?;
        require(&adjustment.id, "Adjustment ID is required")?;
        if adjustment.charge_id.is_empty() {
            adjustment.charge_id = charge_id.to_string();
        } else if adjustment.charge_id != charge_id {
            return Err(ClinicError::validation(format!(
                "Adjustment belongs to charge '{}', not '{}'",
                adjustment.charge_id, charge_id
            )));
        }

        let updated = self
            .charges
            .update_with(charge_id, |charge| {
                if charge.adjustments.iter().any(|a| a.id == adjustment.id) {
                    return Err(ClinicError::duplicate(format!(
                        "Adjustment '{}' was already applied to charge '{}'",
                        adjustment.id, charge.id
                    )));
                }
                charge.adjustments.push(adjustment);
                rebalance(charge);
                Ok(())
            })
            .await?;

        info!(outstanding = %updated.total_outstanding, "Adjustment applied");
        Ok(updated)
    }

    /// Merge the given fields into a charge
    ///
    /// # Errors
    ///
    /// `NotFound` if the charge does not exist, `Validation` for a status
    /// other than CANCELLED or REFUNDED or an empty description.
    #[instrument(skip(self, update))]
    pub async fn update_charge(&self, id: &str, update: ChargeUpdate) -> Result<Charge> {
        require(id, "Charge ID is required")?;
        if let Some(status) = update.status {
            if !status.is_manual() {
                return Err(ClinicError::validation(format!(
                    "Status {status:?} is derived from payments and cannot be set directly"
                )));
            }
        }
        if update.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(ClinicError::validation("Charge description must not be empty"));
        }

        let updated = self
            .charges
            .update_with(id, |charge| {
                let ChargeUpdate {
                    description,
                    status,
                    patient,
                    creator,
                    adjustments,
                    planned_payments,
                    comment,
                    items,
                    location_id,
                    location_name,
                } = update;

                if let Some(description) = description {
                    charge.description = description;
                }
                if let Some(patient) = patient {
                    charge.patient = patient;
                }
                if let Some(creator) = creator {
                    charge.creator = creator;
                }
                if let Some(planned_payments) = planned_payments {
                    charge.planned_payments = planned_payments;
                }
                if let Some(comment) = comment {
                    charge.comment = comment;
                }
                if let Some(items) = items {
                    charge.items = items;
                }
                if let Some(location_id) = location_id {
                    charge.location_id = location_id;
                }
                if let Some(location_name) = location_name {
                    charge.location_name = location_name;
                }
                if let Some(adjustments) = adjustments {
                    charge.adjustments = adjustments;
                    rebalance(charge);
                }
                if let Some(status) = status {
                    charge.status = status;
                }
                Ok(())
            })
            .await?;

        info!(status = ?updated.status, "Charge updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// `NotFound` if the charge does not exist.
    #[instrument(skip(self))]
    pub async fn delete_charge(&self, id: &str) -> Result<Charge> {
        require(id, "Charge ID is required")?;
        self.charges.delete(id).await
    }

    pub async fn get_charges(&self) -> Result<Vec<Charge>> {
        self.charges.all().await
    }

    /// # Errors
    ///
    /// `Validation` if `id` is empty.
    pub async fn get_charge_by_id(&self, id: &str) -> Result<Option<Charge>> {
        require(id, "Charge ID is required")?;
        self.charges.find(id).await
    }

    pub async fn get_charges_by_patient_id(&self, patient_id: &str) -> Result<Vec<Charge>> {
        require(patient_id, "Patient ID is required")?;
        self.charges.filter(|c| c.patient.id == patient_id).await
    }

    pub async fn get_charges_by_status(&self, status: ChargeStatus) -> Result<Vec<Charge>> {
        self.charges.filter(|c| c.status == status).await
    }

    pub async fn get_charges_by_creator(&self, creator_id: &str) -> Result<Vec<Charge>> {
        require(creator_id, "Creator ID is required")?;
        self.charges.filter(|c| c.creator.id == creator_id).await
    }

    pub async fn get_charges_by_location(&self, location_id: &str) -> Result<Vec<Charge>> {
        require(location_id, "Location ID is required")?;
        self.charges
            .filter(|c| c.location_id.as_deref() == Some(location_id))
            .await
    }

    /// Charges with a positive outstanding balance
    pub async fn get_outstanding(&self) -> Result<Vec<Charge>> {
        self.charges
            .filter(|c| c.total_outstanding > Decimal::ZERO)
            .await
    }

    /// Billed, paid, adjusted and outstanding totals for one patient
    pub async fn summary_for_patient(&self, patient_id: &str) -> Result<LedgerSummary> {
        let charges = self.get_charges_by_patient_id(patient_id).await?;
        Ok(LedgerSummary::from_charges(patient_id, &charges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use chrono::Utc;
    use document_store::InMemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn sample_charge(id: &str, total: i64) -> Charge {
        Charge {
            id: id.to_string(),
            total: dec(total),
            total_outstanding: dec(total),
            description: "Annual physical".to_string(),
            status: ChargeStatus::Unpaid,
            patient: ChargePatient {
                id: "p_1".to_string(),
                first_name: "Ana".to_string(),
                ..ChargePatient::default()
            },
            created_date: Utc::now(),
            creator: ChargeCreator {
                id: "u_1".to_string(),
                ..ChargeCreator::default()
            },
            adjustments: vec![],
            payments: vec![],
            planned_payments: vec![],
            comment: None,
            items: vec![],
            location_id: Some("loc_1".to_string()),
            location_name: Some("Main office".to_string()),
        }
    }

    fn payment(id: &str, amount: i64) -> Payment {
        Payment {
            id: id.to_string(),
            amount: dec(amount),
            created_date: Utc::now(),
            payment_method: PaymentCard::default(),
            payment_medium: PaymentMedium::Cash,
            refunds: vec![],
        }
    }

    fn adjustment(id: &str, amount: i64, adjustment_type: AdjustmentType) -> Adjustment {
        Adjustment {
            id: id.to_string(),
            charge_id: String::new(),
            amount: dec(amount),
            adjustment_type,
            description: "Courtesy".to_string(),
            created_date: Utc::now(),
        }
    }

    fn create_test_ledger() -> (ChargeLedger, Arc<InMemoryStore>) {
        let backend = Arc::new(InMemoryStore::new());
        let store = Store::new(backend.clone(), Duration::from_secs(1));
        (ChargeLedger::new(&store), backend)
    }

    #[test]
    fn test_recompute_without_payments_is_unpaid() {
        let mut charge = sample_charge("ch_1", 100);
        let totals = recompute_balance(&mut charge);
        assert_eq!(totals.outstanding, dec(100));
        assert_eq!(charge.status, ChargeStatus::Unpaid);
    }

    #[test]
    fn test_recompute_clamps_at_zero() {
        let mut charge = sample_charge("ch_1", 100);
        charge.payments.push(payment("pay_1", 80));
        charge.adjustments.push(adjustment("adj_1", 50, AdjustmentType::Discount));

        recompute_balance(&mut charge);
        assert_eq!(charge.total_outstanding, Decimal::ZERO);
        assert_eq!(charge.status, ChargeStatus::Paid);
    }

    #[test]
    fn test_negative_surcharge_raises_balance() {
        let mut charge = sample_charge("ch_1", 100);
        charge.adjustments.push(adjustment("adj_1", -20, AdjustmentType::Surcharge));
        recompute_balance(&mut charge);
        assert_eq!(charge.total_outstanding, dec(120));
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        let charge = ledger.apply_payment("ch_1", payment("pay_1", 40)).await.unwrap();
        assert_eq!(charge.status, ChargeStatus::PartiallyPaid);
        assert_eq!(charge.total_outstanding, dec(60));

        let charge = ledger.apply_payment("ch_1", payment("pay_2", 60)).await.unwrap();
        assert_eq!(charge.status, ChargeStatus::Paid);
        assert_eq!(charge.total_outstanding, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_create_validates_required_fields() {
        let (ledger, _) = create_test_ledger();

        let mut charge = sample_charge("ch_1", 100);
        charge.description = String::new();
        let err = ledger.create_charge(charge).await.unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));

        let mut charge = sample_charge("ch_1", 100);
        charge.patient.id = String::new();
        assert!(ledger.create_charge(charge).await.is_err());

        let charge = sample_charge("ch_1", -5);
        assert!(ledger.create_charge(charge).await.is_err());

        assert!(ledger.get_charges().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_recomputes_stale_outstanding() {
        let (ledger, _) = create_test_ledger();
        let mut charge = sample_charge("ch_1", 100);
        charge.total_outstanding = dec(7);
        charge.payments.push(payment("pay_1", 30));

        let stored = ledger.create_charge(charge).await.unwrap();
        assert_eq!(stored.total_outstanding, dec(70));
        assert_eq!(stored.status, ChargeStatus::PartiallyPaid);
    }

    #[tokio::test]
    async fn test_duplicate_payment_is_rejected() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();
        ledger.apply_payment("ch_1", payment("pay_1", 40)).await.unwrap();

        let err = ledger.apply_payment("ch_1", payment("pay_1", 40)).await.unwrap_err();
        assert!(matches!(err, ClinicError::Duplicate(_)));

        let charge = ledger.get_charge_by_id("ch_1").await.unwrap().unwrap();
        assert_eq!(charge.payments.len(), 1);
        assert_eq!(charge.total_outstanding, dec(60));
    }

    #[tokio::test]
    async fn test_invalid_payment_amount() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        let err = ledger.apply_payment("ch_1", payment("pay_1", 0)).await.unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_stored_charge() {
        let (ledger, backend) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        backend.fail_writes(true);
        let err = ledger.apply_payment("ch_1", payment("pay_1", 40)).await.unwrap_err();
        assert!(matches!(err, ClinicError::StoreUnavailable(_)));

        let charge = ledger.get_charge_by_id("ch_1").await.unwrap().unwrap();
        assert!(charge.payments.is_empty());
        assert_eq!(charge.total_outstanding, dec(100));
    }

    #[tokio::test]
    async fn test_apply_adjustment() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        let charge = ledger
            .apply_adjustment("ch_1", adjustment("adj_1", 25, AdjustmentType::InsuranceAdjustment))
            .await
            .unwrap();
        assert_eq!(charge.total_outstanding, dec(75));
        assert_eq!(charge.adjustments[0].charge_id, "ch_1");
        assert_eq!(charge.status, ChargeStatus::Unpaid);

        let mut foreign = adjustment("adj_2", 5, AdjustmentType::Discount);
        foreign.charge_id = "ch_other".to_string();
        let err = ledger.apply_adjustment("ch_1", foreign).await.unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_charge_rules() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        let err = ledger
            .update_charge(
                "ch_1",
                ChargeUpdate {
                    status: Some(ChargeStatus::Paid),
                    ..ChargeUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));

        let charge = ledger
            .update_charge(
                "ch_1",
                ChargeUpdate {
                    comment: Some(Some("Patient disputes".to_string())),
                    adjustments: Some(vec![adjustment("adj_1", 10, AdjustmentType::Discount)]),
                    ..ChargeUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(charge.comment.as_deref(), Some("Patient disputes"));
        assert_eq!(charge.total_outstanding, dec(90));

        let charge = ledger
            .update_charge(
                "ch_1",
                ChargeUpdate {
                    status: Some(ChargeStatus::Cancelled),
                    ..ChargeUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(charge.status, ChargeStatus::Cancelled);

        let err = ledger
            .update_charge("missing", ChargeUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_removing_write_off_reopens_balance() {
        let (ledger, _) = create_test_ledger();
        let mut charge = sample_charge("ch_1", 100);
        charge.adjustments.push(adjustment("adj_1", 100, AdjustmentType::WriteOff));
        let stored = ledger.create_charge(charge).await.unwrap();
        assert_eq!(stored.status, ChargeStatus::Paid);
        assert_eq!(stored.total_outstanding, Decimal::ZERO);

        let charge = ledger
            .update_charge(
                "ch_1",
                ChargeUpdate {
                    adjustments: Some(vec![]),
                    ..ChargeUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(charge.status, ChargeStatus::Unpaid);
        assert_eq!(charge.total_outstanding, dec(100));
        assert!(ledger.get_charges_by_status(ChargeStatus::Paid).await.unwrap().is_empty());
        assert_eq!(ledger.get_outstanding().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_ignores_claimed_paid_status() {
        let (ledger, _) = create_test_ledger();
        let mut charge = sample_charge("ch_1", 100);
        charge.status = ChargeStatus::Paid;
        charge.total_outstanding = Decimal::ZERO;

        let stored = ledger.create_charge(charge).await.unwrap();
        assert_eq!(stored.status, ChargeStatus::Unpaid);
        assert_eq!(stored.total_outstanding, dec(100));

        let mut cancelled = sample_charge("ch_2", 80);
        cancelled.status = ChargeStatus::Cancelled;
        let stored = ledger.create_charge(cancelled).await.unwrap();
        assert_eq!(stored.status, ChargeStatus::Cancelled);
        assert_eq!(stored.total_outstanding, dec(80));
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let (ledger, _) = create_test_ledger();
        let mut charge = sample_charge("ch_1", 100);
        charge.comment = Some("Follow up".to_string());
        ledger.create_charge(charge).await.unwrap();

        let update: ChargeUpdate = serde_json::from_value(serde_json::json!({
            "comment": null,
            "locationId": null,
            "locationName": null
        }))
        .unwrap();
        let charge = ledger.update_charge("ch_1", update).await.unwrap();
        assert_eq!(charge.comment, None);
        assert_eq!(charge.location_id, None);
        assert_eq!(charge.location_name, None);

        let untouched = ledger
            .update_charge("ch_1", serde_json::from_value(serde_json::json!({"description": "Recheck"})).unwrap())
            .await
            .unwrap();
        assert_eq!(untouched.description, "Recheck");
        assert_eq!(untouched.comment, None);
    }

    #[tokio::test]
    async fn test_queries() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();
        let mut other = sample_charge("ch_2", 50);
        other.patient.id = "p_2".to_string();
        other.location_id = None;
        ledger.create_charge(other).await.unwrap();
        ledger.apply_payment("ch_2", payment("pay_1", 50)).await.unwrap();

        assert_eq!(ledger.get_charges_by_patient_id("p_1").await.unwrap().len(), 1);
        assert_eq!(ledger.get_charges_by_creator("u_1").await.unwrap().len(), 2);
        assert_eq!(ledger.get_charges_by_location("loc_1").await.unwrap().len(), 1);
        assert_eq!(
            ledger.get_charges_by_status(ChargeStatus::Paid).await.unwrap()[0].id,
            "ch_2"
        );
        assert_eq!(ledger.get_outstanding().await.unwrap().len(), 1);
        assert!(ledger.get_charges_by_patient_id("").await.is_err());
        assert!(ledger.get_charges_by_patient_id("p_9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_charge() {
        let (ledger, _) = create_test_ledger();
        ledger.create_charge(sample_charge("ch_1", 100)).await.unwrap();

        let removed = ledger.delete_charge("ch_1").await.unwrap();
        assert_eq!(removed.id, "ch_1");
        assert!(ledger.get_charge_by_id("ch_1").await.unwrap().is_none());

        let err = ledger.delete_charge("ch_1").await.unwrap_err();
        assert!(matches!(err, ClinicError::NotFound(_)));
    }
}
