use chrono::{DateTime, Utc};
use document_store::{collections, Aggregate, Flagged};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Patient charge with its payments and adjustments
///
/// Money is stored as a JSON number, so amounts pass through `f64` on the way
/// to and from the store. Values with more than 15 significant digits do not
/// round-trip exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub id: String,
    pub total: Decimal,
    /// Derived: `max(0, total - Σadjustments - Σpayments)`
    pub total_outstanding: Decimal,
    pub description: String,
    pub status: ChargeStatus,
    pub patient: ChargePatient,
    pub created_date: DateTime<Utc>,
    pub creator: ChargeCreator,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Not counted against the balance; nothing drives them to PROCESSED here
    #[serde(default)]
    pub planned_payments: Vec<PlannedPayment>,
    pub comment: Option<String>,
    #[serde(default)]
    pub items: Vec<ChargeItemEntry>,
    pub location_id: Option<String>,
    pub location_name: Option<String>,
}

impl Aggregate for Charge {
    const COLLECTION: &'static str = collections::CHARGES;
    const KIND: &'static str = "Charge";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Charge status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
    Refunded,
}

impl ChargeStatus {
    /// Statuses only reachable through an administrative transition
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }
}

/// Patient snapshot copied onto the charge at creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargePatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargeCreator {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    Discount,
    Surcharge,
    InsuranceAdjustment,
    WriteOff,
}

/// Balance adjustment
///
/// Every adjustment amount is subtracted from the total regardless of its
/// type. A surcharge that should raise the balance is therefore recorded with
/// a negative amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub id: String,
    #[serde(default)]
    pub charge_id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    #[serde(default)]
    pub description: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMedium {
    Card,
    Cash,
    Check,
    BankTransfer,
    Insurance,
}

/// Card details captured on a payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentCard {
    pub id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub amount: Decimal,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_method: PaymentCard,
    pub payment_medium: PaymentMedium,
    #[serde(default)]
    pub refunds: Vec<Refund>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: String,
    pub amount: Decimal,
    pub reason: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlannedPaymentStatus {
    Scheduled,
    Processed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedPayment {
    pub id: String,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub status: PlannedPaymentStatus,
}

/// Catalog item, copied by value onto the charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub active: bool,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
}

/// Line item; its keys are snake_case in the stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeItemEntry {
    pub item_id: String,
    pub charge_id: String,
    pub quantity: u32,
    pub item: ChargeItem,
}

/// Partial update for a charge
///
/// `total`, `totalOutstanding` and `payments` are deliberately absent: the
/// balance only moves through payments and adjustments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargeUpdate {
    pub description: Option<String>,
    /// Only CANCELLED or REFUNDED are accepted
    pub status: Option<ChargeStatus>,
    pub patient: Option<ChargePatient>,
    pub creator: Option<ChargeCreator>,
    pub adjustments: Option<Vec<Adjustment>>,
    pub planned_payments: Option<Vec<PlannedPayment>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub comment: Option<Option<String>>,
    pub items: Option<Vec<ChargeItemEntry>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub location_name: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    Card,
    BankAccount,
}

/// A patient's stored payment instrument
///
/// Card fields (`brand`, `last4`, `expMonth`, `expYear`) and bank fields
/// (`accountHolderType`, `accountNumberLast4`, `bankName`, `routingNumber`)
/// are mutually exclusive, selected by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub exp_month: Option<u32>,
    #[serde(default)]
    pub exp_year: Option<u32>,
    #[serde(default)]
    pub account_holder_type: Option<String>,
    #[serde(default)]
    pub account_number_last4: Option<u32>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub routing_number: Option<u64>,
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    #[serde(default)]
    pub is_default: bool,
}

impl PaymentMethod {
    pub fn has_card_fields(&self) -> bool {
        self.brand.is_some() || self.last4.is_some() || self.exp_month.is_some() || self.exp_year.is_some()
    }

    pub fn has_bank_fields(&self) -> bool {
        self.account_holder_type.is_some()
            || self.account_number_last4.is_some()
            || self.bank_name.is_some()
            || self.routing_number.is_some()
    }
}

impl Aggregate for PaymentMethod {
    const COLLECTION: &'static str = collections::PAYMENT_METHODS;
    const KIND: &'static str = "Payment method";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Flagged for PaymentMethod {
    fn owner(&self) -> &str {
        &self.patient_id
    }

    fn is_flagged(&self) -> bool {
        self.is_default
    }

    fn set_flag(&mut self, flagged: bool) {
        self.is_default = flagged;
    }
}

/// Partial update for a payment method; `id` and `patientId` are fixed
///
/// Card and bank fields are double options: an absent key leaves the field
/// alone and an explicit `null` clears it, which is how a method switches
/// between CARD and BANK_ACCOUNT.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentMethodUpdate {
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub brand: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub last4: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<Option<u32>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<Option<u32>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub account_holder_type: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub account_number_last4: Option<Option<u32>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<Option<u64>>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<PaymentMethodType>,
    pub is_default: Option<bool>,
}
