//! The ledger: keeps account balances consistent with transaction history
//!
//! Every transaction has at most one applied balance effect at any time.
//! Creating a transaction applies the forward effect of its fields; updating
//! one first reverses the effect of the *old* field values, persists the new
//! row, then applies the forward effect of the *new* values; deleting one
//! applies only the reversal. Applying forward then reverse with identical
//! field values is an exact no-op on balances, including when the account
//! changed between snapshots (the old account is refunded, the new one
//! debited).
//!
//! The reversal/application step is an explicit function over a field
//! snapshot rather than a hook hidden inside save, so it can be tested on
//! its own.
//!
//! Known gap: the row write and the balance updates are separate statements
//! with no compensating rollback; a failure in between leaves the balances
//! inconsistent with history.

use rusqlite::params;

use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionKind};

/// Which way to apply a balance effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Sign multiplier: +1 forward, -1 reverse.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Snapshot of the transaction fields that decide its balance effect
///
/// Captured from the persisted row before an update or delete so the old
/// effect can be reversed exactly, regardless of what the new fields are.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEffect {
    pub amount: f64,
    pub kind: TransactionKind,
    pub account_id: Option<i64>,
    pub transfer_account_id: Option<i64>,
}

impl BalanceEffect {
    pub fn of(tx: &Transaction) -> Self {
        Self {
            amount: tx.amount,
            kind: tx.kind,
            account_id: tx.account_id,
            transfer_account_id: tx.transfer_account_id,
        }
    }

    pub fn of_new(tx: &NewTransaction) -> Self {
        Self {
            amount: tx.amount,
            kind: tx.kind,
            account_id: tx.account_id,
            transfer_account_id: tx.transfer_account_id,
        }
    }
}

/// Apply a balance effect to the referenced accounts
///
/// Rules, with `s` = +1 forward / -1 reverse and `A` = amount:
/// - income: account += s*A
/// - expense: account -= s*A
/// - transfer: account -= s*A, transfer_account += s*A; both legs require
///   both accounts to be set, otherwise nothing moves
///
/// A leg whose account row no longer exists is skipped silently (the UPDATE
/// matches zero rows); a transaction with no account attached moves nothing.
pub fn apply_effect(
    conn: &rusqlite::Connection,
    effect: &BalanceEffect,
    direction: Direction,
) -> Result<()> {
    let delta = direction.sign() * effect.amount;

    match effect.kind {
        TransactionKind::Income => {
            if let Some(account_id) = effect.account_id {
                adjust_balance(conn, account_id, delta)?;
            }
        }
        TransactionKind::Expense => {
            if let Some(account_id) = effect.account_id {
                adjust_balance(conn, account_id, -delta)?;
            }
        }
        TransactionKind::Transfer => {
            if let (Some(from), Some(to)) = (effect.account_id, effect.transfer_account_id) {
                adjust_balance(conn, from, -delta)?;
                adjust_balance(conn, to, delta)?;
            }
        }
    }

    Ok(())
}

fn adjust_balance(conn: &rusqlite::Connection, account_id: i64, delta: f64) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET balance = balance + ? WHERE id = ?",
        params![delta, account_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Reverse.sign(), -1.0);
    }

    #[test]
    fn test_snapshot_captures_effect_fields() {
        let tx = NewTransaction {
            user_id: 1,
            amount: 42.5,
            kind: TransactionKind::Transfer,
            category_id: Some(9),
            account_id: Some(1),
            transfer_account_id: Some(2),
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            description: "move".into(),
            tags: String::new(),
        };
        let effect = BalanceEffect::of_new(&tx);
        assert_eq!(effect.amount, 42.5);
        assert_eq!(effect.kind, TransactionKind::Transfer);
        assert_eq!(effect.account_id, Some(1));
        assert_eq!(effect.transfer_account_id, Some(2));
    }
}
