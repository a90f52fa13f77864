//! Derived financial metrics
//!
//! The health score is a 0-100 composite recomputed by the daily job and
//! overwritten in place. Insights are pure read-side observations over the
//! last two months of spending.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;

/// Component breakdown behind a health score
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthBreakdown {
    pub score: i64,
    pub savings_rate: f64,
    pub budget_adherence: f64,
    pub emergency_fund_months: f64,
}

/// Compute a user's financial health score for `today`
///
/// Components: savings rate this month (max 40), emergency fund runway
/// (max 30), budget adherence (max 25), account diversity (+10) and an
/// active goal (+10), clamped to 100.
pub fn health_score(db: &Database, user_id: i64, today: NaiveDate) -> Result<HealthBreakdown> {
    let totals = db.month_totals(user_id, today.year(), today.month())?;

    let savings_rate = if totals.income > 0.0 {
        (totals.income - totals.expenses) / totals.income * 100.0
    } else {
        0.0
    };
    let savings_points = if savings_rate >= 20.0 {
        40
    } else if savings_rate >= 10.0 {
        30
    } else if savings_rate >= 5.0 {
        20
    } else if savings_rate > 0.0 {
        10
    } else {
        0
    };

    let total_balance = db.total_balance(user_id)?;
    let emergency_fund_months = if totals.expenses > 0.0 {
        total_balance / totals.expenses
    } else {
        0.0
    };
    let emergency_points = if emergency_fund_months >= 6.0 {
        30
    } else if emergency_fund_months >= 3.0 {
        20
    } else if emergency_fund_months >= 1.0 {
        10
    } else {
        0
    };

    let budgets = db.list_budgets(user_id)?;
    let budget_adherence = if budgets.is_empty() {
        0.0
    } else {
        let mut sum = 0.0;
        for budget in &budgets {
            if budget.amount <= 0.0 {
                continue;
            }
            let spent = db.budget_spent(budget, today)?;
            let pct_spent = spent / budget.amount * 100.0;
            sum += (100.0 - pct_spent).max(0.0);
        }
        sum / budgets.len() as f64
    };
    let adherence_points = (budget_adherence / 100.0 * 25.0).round() as i64;

    let mut score = savings_points + emergency_points + adherence_points;
    if db.count_accounts(user_id)? >= 3 {
        score += 10;
    }
    if db.count_active_goals(user_id)? >= 1 {
        score += 10;
    }

    Ok(HealthBreakdown {
        score: score.clamp(0, 100),
        savings_rate,
        budget_adherence,
        emergency_fund_months,
    })
}

/// Tone of an insight, for client rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightLevel {
    Info,
    Success,
    Warning,
}

/// One observation about recent spending
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub level: InsightLevel,
    pub message: String,
}

/// Read-side spending observations for the current month
pub fn spending_insights(db: &Database, user_id: i64, today: NaiveDate) -> Result<Vec<Insight>> {
    let mut insights = Vec::new();

    let this_month = db.month_totals(user_id, today.year(), today.month())?;
    let prev = crate::schedule::add_months(today, -1);
    let last_month = db.month_totals(user_id, prev.year(), prev.month())?;

    if last_month.expenses > 0.0 {
        let change = (this_month.expenses - last_month.expenses) / last_month.expenses * 100.0;
        if change > 20.0 {
            insights.push(Insight {
                level: InsightLevel::Warning,
                message: format!("Spending is up {:.0}% compared to last month", change),
            });
        } else if change < -10.0 {
            insights.push(Insight {
                level: InsightLevel::Success,
                message: format!("Spending is down {:.0}% compared to last month", -change),
            });
        }
    }

    if this_month.expenses > 0.0 {
        let month_start = today.with_day(1).unwrap_or(today);
        let by_category = db.spending_by_category(user_id, month_start, today)?;
        if let Some(top) = by_category.first() {
            let share = top.total / this_month.expenses * 100.0;
            if share > 40.0 {
                insights.push(Insight {
                    level: InsightLevel::Warning,
                    message: format!(
                        "{:.0}% of this month's spending is in {}",
                        share, top.name
                    ),
                });
            }
        }
    }

    let count = db.count_month_transactions(user_id, today.year(), today.month())?;
    if count > 50 {
        insights.push(Insight {
            level: InsightLevel::Info,
            message: format!("{} transactions recorded this month", count),
        });
    }

    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NewTransaction, TransactionKind};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(user_id: i64, amount: f64, kind: TransactionKind, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            user_id,
            amount,
            kind,
            category_id: None,
            account_id: None,
            transfer_account_id: None,
            date,
            description: String::new(),
            tags: String::new(),
        }
    }

    #[test]
    fn test_health_score_empty_user() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("empty", None).unwrap();

        let breakdown = health_score(&db, user_id, d(2025, 6, 15)).unwrap();
        assert_eq!(breakdown.score, 0);
        assert_eq!(breakdown.savings_rate, 0.0);
    }

    #[test]
    fn test_health_score_savings_bucket() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("saver", None).unwrap();
        let today = d(2025, 6, 15);

        db.create_transaction(&tx(user_id, 1000.0, TransactionKind::Income, today))
            .unwrap();
        db.create_transaction(&tx(user_id, 700.0, TransactionKind::Expense, today))
            .unwrap();

        // 30% savings rate earns the full 40 points; no balances, budgets,
        // accounts, or goals, so nothing else contributes.
        let breakdown = health_score(&db, user_id, today).unwrap();
        assert_eq!(breakdown.score, 40);
        assert!((breakdown.savings_rate - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_health_score_clamped_at_100() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("max", None).unwrap();
        let today = d(2025, 6, 15);

        for name in ["a", "b", "c"] {
            db.create_account(user_id, name, crate::models::AccountType::Bank, 10_000.0)
                .unwrap();
        }
        db.create_goal(user_id, "house", 50_000.0, None, "").unwrap();
        db.create_transaction(&tx(user_id, 5000.0, TransactionKind::Income, today))
            .unwrap();
        db.create_transaction(&tx(user_id, 500.0, TransactionKind::Expense, today))
            .unwrap();

        // Untouched budgets give full adherence, pushing the raw total past 100
        for name in ["food", "fun"] {
            let category_id = db.get_or_create_category(name).unwrap();
            db.create_budget(user_id, name, category_id, 300.0, None, None)
                .unwrap();
        }

        let breakdown = health_score(&db, user_id, today).unwrap();
        assert_eq!(breakdown.score, 100);
        assert!((breakdown.budget_adherence - 100.0).abs() < 1e-9);
        assert!(breakdown.emergency_fund_months >= 6.0);
    }

    #[test]
    fn test_insights_spending_spike() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("spender", None).unwrap();

        db.create_transaction(&tx(user_id, 100.0, TransactionKind::Expense, d(2025, 5, 10)))
            .unwrap();
        db.create_transaction(&tx(user_id, 200.0, TransactionKind::Expense, d(2025, 6, 10)))
            .unwrap();

        let insights = spending_insights(&db, user_id, d(2025, 6, 15)).unwrap();
        assert!(insights
            .iter()
            .any(|i| i.level == InsightLevel::Warning && i.message.contains("up 100%")));
    }
}
