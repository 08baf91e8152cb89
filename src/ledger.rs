//! Ledger entries, payment applications, and the reconciliation calculator.
//!
//! A ledger entry is a recorded fact with a reference value (the system of
//! record at entry time: a credit's principal, the system stock count) and
//! an observed side (applied payments, the physical count). Entries are
//! created once and never edited in place; later actions add applications
//! or void existing ones. Voiding is a status flip preserved for the audit
//! trail, never a physical delete.
//!
//! Balances and deltas are projections: recomputed from live data on every
//! call, never cached client-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a ledger entry or payment application.
///
/// The backend historically spells these `activo`/`anulado`; both spellings
/// deserialize, the canonical form serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    #[serde(
        rename = "ACTIVE",
        alias = "active",
        alias = "activo",
        alias = "Activo"
    )]
    Active,
    #[serde(
        rename = "VOIDED",
        alias = "voided",
        alias = "anulado",
        alias = "Anulado"
    )]
    Voided,
}

impl EntryStatus {
    pub fn is_active(self) -> bool {
        matches!(self, EntryStatus::Active)
    }
}

/// A payment (or adjustment) applied against a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub id: String,
    #[serde(rename = "credito_id", alias = "parentLedgerId")]
    pub parent_ledger_id: String,
    #[serde(rename = "monto_pago", alias = "amount")]
    pub amount: f64,
    #[serde(rename = "fecha_pago", alias = "appliedAt", default)]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(rename = "estado", alias = "status", default = "default_status")]
    pub status: EntryStatus,
    #[serde(rename = "observaciones", alias = "notes", default)]
    pub notes: Option<String>,
}

fn default_status() -> EntryStatus {
    EntryStatus::Active
}

/// The two sides of a balance: what is still owed, and how much the active
/// payments exceed the principal. Keeping the overpayment explicit means the
/// UI can render a "credit" state instead of silently discarding it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceProjection {
    pub outstanding: f64,
    pub overpaid: f64,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Stock discrepancy for an inventory audit line.
///
/// Returns `0.0` while the physical count has not been entered yet, so no
/// discrepancy is shown for untouched rows. Negative means shortage,
/// positive means surplus.
pub fn inventory_delta(system_stock: f64, physical_stock: Option<f64>) -> f64 {
    match physical_stock {
        Some(physical) => physical - system_stock,
        None => 0.0,
    }
}

/// Sum of amounts over payments that are still active.
pub fn active_payment_total(payments: &[PaymentApplication]) -> f64 {
    payments
        .iter()
        .filter(|p| p.status.is_active())
        .map(|p| p.amount)
        .sum()
}

/// Outstanding balance of a credit: principal minus active payments,
/// clamped at zero for display.
pub fn outstanding_balance(principal: f64, payments: &[PaymentApplication]) -> f64 {
    (principal - active_payment_total(payments)).max(0.0)
}

/// Signed balance projection: the clamped outstanding amount plus the
/// overpayment remainder that clamping would otherwise discard.
pub fn balance_projection(principal: f64, payments: &[PaymentApplication]) -> BalanceProjection {
    let signed = principal - active_payment_total(payments);
    BalanceProjection {
        outstanding: signed.max(0.0),
        overpaid: (-signed).max(0.0),
    }
}

/// Parse a backend payment list (bare array or normalised items) into typed
/// applications. Rows that do not parse are skipped rather than failing the
/// whole projection; the backend owns validation.
pub fn parse_payments(items: &[Value]) -> Vec<PaymentApplication> {
    items
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payment(amount: f64, status: EntryStatus) -> PaymentApplication {
        PaymentApplication {
            id: uuid::Uuid::new_v4().to_string(),
            parent_ledger_id: "cred-1".into(),
            amount,
            applied_at: None,
            status,
            notes: None,
        }
    }

    #[test]
    fn delta_is_zero_until_physical_count_entered() {
        assert_eq!(inventory_delta(50.0, None), 0.0);
        assert_eq!(inventory_delta(-12.5, None), 0.0);
    }

    #[test]
    fn delta_shortage_and_surplus() {
        assert_eq!(inventory_delta(50.0, Some(47.0)), -3.0);
        assert_eq!(inventory_delta(47.0, Some(53.0)), 6.0);
        assert_eq!(inventory_delta(50.0, Some(50.0)), 0.0);
    }

    #[test]
    fn no_payments_means_full_balance_due() {
        assert_eq!(outstanding_balance(1_000_000.0, &[]), 1_000_000.0);
    }

    #[test]
    fn apply_and_void_scenario() {
        // principal 1,000,000; pay 400,000 -> 600,000; pay 700,000 -> 0
        // (overpaid by 100,000); void the second payment -> 600,000 again.
        let principal = 1_000_000.0;
        let mut payments = vec![payment(400_000.0, EntryStatus::Active)];
        assert_eq!(outstanding_balance(principal, &payments), 600_000.0);

        payments.push(payment(700_000.0, EntryStatus::Active));
        assert_eq!(outstanding_balance(principal, &payments), 0.0);
        let proj = balance_projection(principal, &payments);
        assert_eq!(proj.outstanding, 0.0);
        assert_eq!(proj.overpaid, 100_000.0);

        payments[1].status = EntryStatus::Voided;
        assert_eq!(outstanding_balance(principal, &payments), 600_000.0);
        let proj = balance_projection(principal, &payments);
        assert_eq!(proj.overpaid, 0.0);
    }

    #[test]
    fn voided_payments_do_not_count() {
        let payments = vec![
            payment(250.0, EntryStatus::Voided),
            payment(100.0, EntryStatus::Active),
        ];
        assert_eq!(active_payment_total(&payments), 100.0);
        assert_eq!(outstanding_balance(500.0, &payments), 400.0);
    }

    #[test]
    fn status_accepts_backend_spelling() {
        let p: PaymentApplication = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "credito_id": "c-1",
            "monto_pago": 150000.0,
            "estado": "anulado"
        }))
        .expect("backend-spelled payment should parse");
        assert_eq!(p.status, EntryStatus::Voided);

        let round_tripped = serde_json::to_value(&p).expect("serialize payment");
        assert_eq!(
            round_tripped.get("estado").and_then(Value::as_str),
            Some("VOIDED")
        );
    }

    #[test]
    fn parse_payments_skips_malformed_rows() {
        let items = vec![
            serde_json::json!({
                "id": "p-1",
                "credito_id": "c-1",
                "monto_pago": 100.0,
                "estado": "ACTIVE"
            }),
            serde_json::json!({ "garbage": true }),
        ];
        let parsed = parse_payments(&items);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].amount, 100.0);
    }

    // -- Property tests ------------------------------------------------------

    fn arb_payments() -> impl Strategy<Value = Vec<PaymentApplication>> {
        prop::collection::vec((0.0f64..1e9, prop::bool::ANY), 0..32).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(amount, active)| {
                    payment(
                        amount,
                        if active {
                            EntryStatus::Active
                        } else {
                            EntryStatus::Voided
                        },
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn delta_unset_is_always_zero(system in -1e9f64..1e9) {
            prop_assert_eq!(inventory_delta(system, None), 0.0);
        }

        #[test]
        fn delta_is_difference(system in -1e6f64..1e6, physical in -1e6f64..1e6) {
            prop_assert_eq!(inventory_delta(system, Some(physical)), physical - system);
        }

        #[test]
        fn balance_never_negative(
            principal in 0.0f64..1e9,
            payments in arb_payments(),
        ) {
            prop_assert!(outstanding_balance(principal, &payments) >= 0.0);
        }

        #[test]
        fn empty_payment_list_owes_principal(principal in 0.0f64..1e9) {
            prop_assert_eq!(outstanding_balance(principal, &[]), principal);
        }

        #[test]
        fn voiding_a_payment_never_decreases_balance(
            principal in 0.0f64..1e9,
            mut payments in arb_payments(),
            idx in 0usize..32,
        ) {
            prop_assume!(!payments.is_empty());
            let idx = idx % payments.len();
            prop_assume!(payments[idx].status.is_active());

            let before = outstanding_balance(principal, &payments);
            payments[idx].status = EntryStatus::Voided;
            let after = outstanding_balance(principal, &payments);
            prop_assert!(after >= before);
        }

        #[test]
        fn projection_sides_are_exclusive(
            principal in 0.0f64..1e9,
            payments in arb_payments(),
        ) {
            let proj = balance_projection(principal, &payments);
            prop_assert!(proj.outstanding >= 0.0);
            prop_assert!(proj.overpaid >= 0.0);
            // At most one side is non-zero.
            prop_assert!(proj.outstanding == 0.0 || proj.overpaid == 0.0);
        }
    }
}
