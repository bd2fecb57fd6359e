use crate::ledger::BalanceTotals;
use crate::models::{Charge, ChargeStatus};
use rust_decimal::Decimal;
use serde::Serialize;

/// Per-patient balance overview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub patient_id: String,
    pub charge_count: usize,
    /// Sum of charge totals, cancelled charges excluded
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub total_adjusted: Decimal,
    pub total_outstanding: Decimal,
    /// Sum of refunds recorded against payments
    pub total_refunded: Decimal,
}

impl LedgerSummary {
    pub fn from_charges(patient_id: &str, charges: &[Charge]) -> Self {
        let mut summary = Self {
            patient_id: patient_id.to_string(),
            charge_count: charges.len(),
            total_billed: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_adjusted: Decimal::ZERO,
            total_outstanding: Decimal::ZERO,
            total_refunded: Decimal::ZERO,
        };

        for charge in charges {
            let totals = BalanceTotals::of(charge);
            summary.total_paid += totals.paid;
            summary.total_adjusted += totals.adjusted;
            summary.total_refunded += charge
                .payments
                .iter()
                .flat_map(|p| p.refunds.iter())
                .map(|r| r.amount)
                .sum::<Decimal>();

            if charge.status != ChargeStatus::Cancelled {
                summary.total_billed += charge.total;
                summary.total_outstanding += charge.total_outstanding;
            }
        }

        summary
    }
}
