//! Transaction operations
//!
//! Create, update, and delete go through the ledger so account balances
//! always reflect the current field values. Splits and templates live here
//! too since they hang off transactions.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::ledger::{apply_effect, BalanceEffect, Direction};
use crate::models::{NewTransaction, Transaction, TransactionSplit, TransactionTemplate};

impl Database {
    /// Create a transaction and apply its forward balance effect
    pub fn create_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, amount, kind, category_id, account_id,
                                      transfer_account_id, date, description, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.user_id,
                tx.amount,
                tx.kind.as_str(),
                tx.category_id,
                tx.account_id,
                tx.transfer_account_id,
                tx.date.to_string(),
                tx.description,
                tx.tags,
            ],
        )?;
        let id = conn.last_insert_rowid();

        apply_effect(&conn, &BalanceEffect::of_new(tx), Direction::Forward)?;

        Ok(id)
    }

    /// Update a transaction: reverse the old effect, persist the new fields,
    /// apply the new effect
    ///
    /// The old snapshot is read from the persisted row, not from the caller,
    /// so the reversal always matches what was actually applied.
    pub fn update_transaction(&self, id: i64, tx: &NewTransaction) -> Result<()> {
        let conn = self.conn()?;

        let old = self
            .get_transaction(id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        apply_effect(&conn, &BalanceEffect::of(&old), Direction::Reverse)?;

        conn.execute(
            r#"
            UPDATE transactions
            SET amount = ?, kind = ?, category_id = ?, account_id = ?,
                transfer_account_id = ?, date = ?, description = ?, tags = ?
            WHERE id = ?
            "#,
            params![
                tx.amount,
                tx.kind.as_str(),
                tx.category_id,
                tx.account_id,
                tx.transfer_account_id,
                tx.date.to_string(),
                tx.description,
                tx.tags,
                id,
            ],
        )?;

        apply_effect(&conn, &BalanceEffect::of_new(tx), Direction::Forward)?;

        Ok(())
    }

    /// Delete a transaction, reversing its balance effect first
    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let old = self
            .get_transaction(id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        apply_effect(&conn, &BalanceEffect::of(&old), Direction::Reverse)?;

        conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;

        Ok(())
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_TRANSACTION),
                params![id],
                Self::row_to_transaction,
            )
            .optional()?;

        Ok(tx)
    }

    /// List a user's transactions, newest first
    pub fn list_transactions(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_TRANSACTION
        ))?;

        let txs = stmt
            .query_map(params![user_id, limit, offset], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// List every transaction for a user, newest first
    ///
    /// Export-only; the paged variant is the one the handlers use.
    pub fn list_all_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY date DESC, id DESC",
            SELECT_TRANSACTION
        ))?;

        let txs = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// List a user's transactions within a date range (inclusive), newest first
    pub fn list_transactions_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date DESC, id DESC",
            SELECT_TRANSACTION
        ))?;

        let txs = stmt
            .query_map(
                params![user_id, from.to_string(), to.to_string()],
                Self::row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// Count a user's transactions
    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let kind_str: String = row.get(3)?;
        let date_str: String = row.get(7)?;
        let created_at_str: String = row.get(10)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            kind: kind_str.parse().unwrap_or_default(),
            category_id: row.get(4)?,
            account_id: row.get(5)?,
            transfer_account_id: row.get(6)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            description: row.get(8)?,
            tags: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    // ============================================
    // Splits
    // ============================================

    /// Add a category split to a transaction
    ///
    /// Splits are reporting metadata: they never move balances and their sum
    /// is not reconciled against the parent amount.
    pub fn add_split(
        &self,
        transaction_id: i64,
        category_id: Option<i64>,
        amount: f64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transaction_splits (transaction_id, category_id, amount) VALUES (?, ?, ?)",
            params![transaction_id, category_id, amount],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a transaction's splits
    pub fn list_splits(&self, transaction_id: i64) -> Result<Vec<TransactionSplit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, transaction_id, category_id, amount FROM transaction_splits
             WHERE transaction_id = ? ORDER BY id",
        )?;

        let splits = stmt
            .query_map(params![transaction_id], |row| {
                Ok(TransactionSplit {
                    id: row.get(0)?,
                    transaction_id: row.get(1)?,
                    category_id: row.get(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(splits)
    }

    /// Update a split's category or amount
    pub fn update_split(&self, id: i64, category_id: Option<i64>, amount: f64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transaction_splits SET category_id = ?, amount = ? WHERE id = ?",
            params![category_id, amount, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("split {}", id)));
        }
        Ok(())
    }

    /// Delete a split
    pub fn delete_split(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM transaction_splits WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("split {}", id)));
        }
        Ok(())
    }

    // ============================================
    // Templates
    // ============================================

    /// Create a reusable transaction template
    pub fn create_template(&self, template: &TransactionTemplate) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transaction_templates (user_id, name, amount, kind, category_id,
                                               account_id, description, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                template.user_id,
                template.name,
                template.amount,
                template.kind.as_str(),
                template.category_id,
                template.account_id,
                template.description,
                template.tags,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's templates
    pub fn list_templates(&self, user_id: i64) -> Result<Vec<TransactionTemplate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, name, amount, kind, category_id, account_id,
                   description, tags, use_count
            FROM transaction_templates WHERE user_id = ? ORDER BY use_count DESC, name
            "#,
        )?;

        let templates = stmt
            .query_map(params![user_id], |row| {
                let kind_str: String = row.get(4)?;
                Ok(TransactionTemplate {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    amount: row.get(3)?,
                    kind: kind_str.parse().unwrap_or_default(),
                    category_id: row.get(5)?,
                    account_id: row.get(6)?,
                    description: row.get(7)?,
                    tags: row.get(8)?,
                    use_count: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(templates)
    }

    /// Create a transaction from a template, dated today, and bump its use count
    pub fn use_template(&self, template_id: i64, today: NaiveDate) -> Result<i64> {
        let template = {
            let conn = self.conn()?;
            conn.query_row(
                r#"
                SELECT id, user_id, name, amount, kind, category_id, account_id,
                       description, tags, use_count
                FROM transaction_templates WHERE id = ?
                "#,
                params![template_id],
                |row| {
                    let kind_str: String = row.get(4)?;
                    Ok(TransactionTemplate {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        amount: row.get(3)?,
                        kind: kind_str.parse().unwrap_or_default(),
                        category_id: row.get(5)?,
                        account_id: row.get(6)?,
                        description: row.get(7)?,
                        tags: row.get(8)?,
                        use_count: row.get(9)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("template {}", template_id)))?
        };

        let tx_id = self.create_transaction(&NewTransaction {
            user_id: template.user_id,
            amount: template.amount,
            kind: template.kind,
            category_id: template.category_id,
            account_id: template.account_id,
            transfer_account_id: None,
            date: today,
            description: template.description.clone(),
            tags: template.tags.clone(),
        })?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE transaction_templates SET use_count = use_count + 1 WHERE id = ?",
            params![template_id],
        )?;

        Ok(tx_id)
    }

    /// Delete a template
    pub fn delete_template(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM transaction_templates WHERE id = ?",
            params![id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("template {}", id)));
        }
        Ok(())
    }
}

const SELECT_TRANSACTION: &str = r#"
    SELECT id, user_id, amount, kind, category_id, account_id,
           transfer_account_id, date, description, tags, created_at
    FROM transactions
"#;
