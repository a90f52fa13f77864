//! CSV export and best-effort import
//!
//! The export layout interleaves split rows after their parent transaction,
//! marked with `is_split=1` and the parent's id. Import never fails a whole
//! batch: malformed rows are skipped and counted, and a row only moves an
//! account balance when its account column matches an existing account.

use std::io::{Read, Write};

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{NewTransaction, TransactionKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CsvRow {
    date: String,
    time: String,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    category: String,
    account: String,
    description: String,
    tags: String,
    parent_id: String,
    is_split: String,
    split_category: String,
    split_amount: String,
}

/// Write all of a user's transactions (and their splits) as CSV
pub fn export_csv<W: Write>(db: &Database, user_id: i64, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let accounts = db.list_accounts(user_id)?;
    let account_name = |id: Option<i64>| -> String {
        id.and_then(|id| accounts.iter().find(|a| a.id == id))
            .map(|a| a.name.clone())
            .unwrap_or_default()
    };

    for tx in db.list_all_transactions(user_id)? {
        let category = match tx.category_id {
            Some(id) => db.category_name(id)?.unwrap_or_default(),
            None => String::new(),
        };

        wtr.serialize(CsvRow {
            date: tx.date.to_string(),
            time: tx.created_at.format("%H:%M:%S").to_string(),
            kind: tx.kind.as_str().to_string(),
            amount: format!("{:.2}", tx.amount),
            category,
            account: account_name(tx.account_id),
            description: tx.description.clone(),
            tags: tx.tags.clone(),
            is_split: "0".to_string(),
            ..Default::default()
        })?;

        for split in db.list_splits(tx.id)? {
            let split_category = match split.category_id {
                Some(id) => db.category_name(id)?.unwrap_or_default(),
                None => String::new(),
            };
            wtr.serialize(CsvRow {
                date: tx.date.to_string(),
                time: tx.created_at.format("%H:%M:%S").to_string(),
                parent_id: tx.id.to_string(),
                is_split: "1".to_string(),
                split_category,
                split_amount: format!("{:.2}", split.amount),
                ..Default::default()
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Counts from one import run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub splits: usize,
    pub skipped: usize,
}

/// Import transactions from CSV, best-effort per row
///
/// Split rows attach to the most recently imported parent; split rows that
/// arrive before any parent are skipped. Unknown accounts import the row
/// with no account, which moves no balance.
pub fn import_csv<R: Read>(
    db: &Database,
    user_id: i64,
    reader: R,
    today: NaiveDate,
) -> Result<ImportSummary> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let accounts = db.list_accounts(user_id)?;
    let mut summary = ImportSummary::default();
    let mut last_parent: Option<i64> = None;

    for record in rdr.deserialize::<CsvRow>() {
        let Ok(row) = record else {
            summary.skipped += 1;
            continue;
        };

        if row.is_split.trim() == "1" {
            let (Some(parent_id), Ok(amount)) =
                (last_parent, row.split_amount.trim().parse::<f64>())
            else {
                summary.skipped += 1;
                continue;
            };
            let category_id = match row.split_category.trim() {
                "" => None,
                name => Some(db.get_or_create_category(name)?),
            };
            db.add_split(parent_id, category_id, amount)?;
            summary.splits += 1;
            continue;
        }

        let Ok(amount) = row.amount.trim().parse::<f64>() else {
            summary.skipped += 1;
            continue;
        };
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").unwrap_or(today);
        let kind: TransactionKind = row.kind.trim().parse().unwrap_or_default();

        let category_id = match row.category.trim() {
            "" => None,
            name => Some(db.get_or_create_category(name)?),
        };
        let account_id = accounts
            .iter()
            .find(|a| a.name == row.account.trim())
            .map(|a| a.id);

        let id = db.create_transaction(&NewTransaction {
            user_id,
            amount,
            kind,
            category_id,
            account_id,
            transfer_account_id: None,
            date,
            description: row.description.trim().to_string(),
            tags: row.tags.trim().to_string(),
        })?;
        last_parent = Some(id);
        summary.imported += 1;
    }

    debug!(
        imported = summary.imported,
        splits = summary.splits,
        skipped = summary.skipped,
        "CSV import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_import_basic_rows() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("importer", None).unwrap();
        db.create_account(user_id, "Checking", AccountType::Bank, 100.0)
            .unwrap();

        let csv = "\
date,time,type,amount,category,account,description,tags,parent_id,is_split,split_category,split_amount
2025-06-01,09:00:00,expense,25.00,Groceries,Checking,weekly shop,,,0,,
2025-06-02,10:00:00,income,500.00,,Checking,salary,,,0,,
";
        let summary = import_csv(&db, user_id, csv.as_bytes(), d(2025, 6, 15)).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 0);

        // Both rows matched the account, so the ledger moved the balance.
        let account = db.list_accounts(user_id).unwrap().remove(0);
        assert!((account.balance - 575.0).abs() < 1e-9);
    }

    #[test]
    fn test_import_skips_malformed_and_unknown_accounts() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("importer2", None).unwrap();

        let csv = "\
date,time,type,amount,category,account,description,tags,parent_id,is_split,split_category,split_amount
2025-06-01,,expense,not-a-number,,,bad amount,,,0,,
garbage-date,,expense,10.00,,NoSuchAccount,falls back to today,,,0,,
";
        let today = d(2025, 6, 15);
        let summary = import_csv(&db, user_id, csv.as_bytes(), today).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);

        let txs = db.list_all_transactions(user_id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].date, today);
        assert_eq!(txs[0].account_id, None);
    }

    #[test]
    fn test_split_rows_attach_to_parent() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("splitter", None).unwrap();

        let csv = "\
date,time,type,amount,category,account,description,tags,parent_id,is_split,split_category,split_amount
2025-06-01,,expense,100.00,Shopping,,big haul,,,0,,
2025-06-01,,,,,,,,1,1,Groceries,60.00
2025-06-01,,,,,,,,1,1,Household,40.00
";
        let summary = import_csv(&db, user_id, csv.as_bytes(), d(2025, 6, 15)).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.splits, 2);

        let parent = db.list_all_transactions(user_id).unwrap().remove(0);
        let splits = db.list_splits(parent.id).unwrap();
        assert_eq!(splits.len(), 2);
        assert!((splits[0].amount - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_round_trips_header_and_splits() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("exporter", None).unwrap();
        let category_id = db.get_or_create_category("Food").unwrap();

        let tx_id = db
            .create_transaction(&NewTransaction {
                user_id,
                amount: 30.0,
                kind: TransactionKind::Expense,
                category_id: Some(category_id),
                account_id: None,
                transfer_account_id: None,
                date: d(2025, 6, 1),
                description: "lunch".into(),
                tags: "work".into(),
            })
            .unwrap();
        db.add_split(tx_id, Some(category_id), 30.0).unwrap();

        let mut out = Vec::new();
        export_csv(&db, user_id, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,time,type,amount,category,account,description,tags,parent_id,is_split,split_category,split_amount"
        );
        let parent_line = lines.next().unwrap();
        assert!(parent_line.contains("expense"));
        assert!(parent_line.contains("Food"));
        let split_line = lines.next().unwrap();
        assert!(split_line.contains(&format!("{},1,Food,30.00", tx_id)));
    }
}
