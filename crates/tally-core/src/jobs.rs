//! Background jobs: the recurring scheduler, bill payment, and the
//! notification aggregators
//!
//! Every aggregator is idempotent for a given day's data. Budget alerts
//! dedup through the budget_alerts UNIQUE constraint; the rest dedup with
//! existence queries before inserting. Each job returns how many items it
//! produced so callers can log a summary.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    BillStatus, BudgetThreshold, NewBill, NewTransaction, NotificationKind, Priority,
    TransactionKind, UserPreferences,
};
use crate::schedule;

/// Apply all due recurring rules up to `today`
///
/// A rule several periods behind yields one transaction per missed period
/// and ends with the first future-or-equal cursor. Rules whose cursor steps
/// past `end_date` are deactivated mid-loop.
pub fn apply_recurring(db: &Database, today: NaiveDate) -> Result<usize> {
    let mut created = 0;

    for rule in db.list_due_recurring(today)? {
        let mut next = rule.next_date;
        let mut active = true;

        while next <= today {
            db.create_transaction(&NewTransaction {
                user_id: rule.user_id,
                amount: rule.amount,
                kind: rule.kind,
                category_id: rule.category_id,
                account_id: rule.account_id,
                transfer_account_id: None,
                date: next,
                description: rule.description.clone(),
                tags: rule.tags.clone(),
            })?;
            created += 1;

            next = schedule::advance_recurring(next, rule.frequency);
            if rule.end_date.is_some_and(|end| next > end) {
                active = false;
                break;
            }
        }

        db.set_recurring_next_date(rule.id, next)?;
        if !active {
            db.set_recurring_active(rule.id, false)?;
            debug!(rule_id = rule.id, "Recurring rule reached its end date");
        }
    }

    if created > 0 {
        info!(created, "Applied recurring rules");
    }
    Ok(created)
}

/// Pay a bill: mark it paid, record the expense, and queue the next cycle
///
/// The payment goes through the ledger, so the bill's account balance drops
/// by the amount. Recurring bills get a fresh pending instance with the due
/// date advanced; the paid row stays behind as history.
pub fn pay_bill(db: &Database, bill_id: i64, today: NaiveDate) -> Result<()> {
    let bill = db
        .get_bill(bill_id)?
        .ok_or_else(|| Error::NotFound(format!("bill {}", bill_id)))?;

    if bill.status == BillStatus::Paid {
        return Err(Error::InvalidData(format!(
            "bill {} is already paid",
            bill_id
        )));
    }

    db.set_bill_status(bill.id, BillStatus::Paid)?;
    db.create_transaction(&NewTransaction {
        user_id: bill.user_id,
        amount: bill.amount,
        kind: TransactionKind::Expense,
        category_id: bill.category_id,
        account_id: bill.account_id,
        transfer_account_id: None,
        date: today,
        description: format!("Bill payment: {}", bill.name),
        tags: String::new(),
    })?;

    if let Some(next_due) = schedule::advance_bill(bill.due_date, bill.frequency) {
        db.create_bill(&NewBill {
            user_id: bill.user_id,
            name: bill.name.clone(),
            amount: bill.amount,
            category_id: bill.category_id,
            account_id: bill.account_id,
            due_date: next_due,
            frequency: bill.frequency,
            description: bill.description.clone(),
            reminder_days: bill.reminder_days,
            auto_pay: bill.auto_pay,
        })?;
    }

    info!(bill_id, name = %bill.name, "Bill paid");
    Ok(())
}

/// Check active budgets against their thresholds and alert on fresh crossings
pub fn check_budget_alerts(db: &Database, today: NaiveDate) -> Result<usize> {
    let mut alerted = 0;

    for budget in db.list_active_budgets(today)? {
        if budget.amount <= 0.0 {
            continue;
        }
        let spent = db.budget_spent(&budget, today)?;
        let pct = spent / budget.amount * 100.0;

        // Only the single highest crossed threshold fires.
        let Some(threshold) = BudgetThreshold::DESCENDING
            .iter()
            .copied()
            .find(|t| pct >= t.percent())
        else {
            continue;
        };

        if !db.record_budget_alert(budget.id, threshold)? {
            continue;
        }

        let priority = if pct >= 90.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        let title = format!("Budget Alert: {}", budget.name);
        let message = format!(
            "You've used {:.1}% of your {} budget (${:.2} of ${:.2})",
            pct, budget.name, spent, budget.amount
        );
        db.create_notification(
            budget.user_id,
            &title,
            &message,
            NotificationKind::BudgetAlert,
            priority,
            today,
        )?;

        let prefs = db.get_preferences(budget.user_id)?;
        if prefs.budget_alerts {
            queue_email(db, budget.user_id, &prefs, &title, &message)?;
        }
        alerted += 1;
    }

    if alerted > 0 {
        info!(alerted, "Budget alerts created");
    }
    Ok(alerted)
}

/// Remind about pending bills due within the week
///
/// Overdue bills flip to the overdue status as a side effect. At most one
/// reminder per (user, title, day), keyed on the `today` the run is for.
pub fn check_bill_reminders(db: &Database, today: NaiveDate) -> Result<usize> {
    let mut reminded = 0;

    for bill in db.list_pending_bills()? {
        let days = bill.days_until_due(today);
        if days > 7 || days > bill.reminder_days {
            continue;
        }

        let title = format!("Bill Reminder: {}", bill.name);
        let (message, priority) = if days == 0 {
            (
                format!("Your bill '{}' for ${:.2} is due today!", bill.name, bill.amount),
                Priority::Urgent,
            )
        } else if days < 0 {
            db.set_bill_status(bill.id, BillStatus::Overdue)?;
            (
                format!(
                    "Your bill '{}' for ${:.2} is {} days overdue!",
                    bill.name,
                    bill.amount,
                    -days
                ),
                Priority::Urgent,
            )
        } else {
            (
                format!(
                    "Your bill '{}' for ${:.2} is due in {} days.",
                    bill.name, bill.amount, days
                ),
                Priority::Medium,
            )
        };

        if db.notification_exists_today(bill.user_id, NotificationKind::BillReminder, &title, today)? {
            continue;
        }

        db.create_notification(
            bill.user_id,
            &title,
            &message,
            NotificationKind::BillReminder,
            priority,
            today,
        )?;

        let prefs = db.get_preferences(bill.user_id)?;
        if prefs.bill_reminders {
            queue_email(db, bill.user_id, &prefs, &title, &message)?;
        }
        reminded += 1;
    }

    if reminded > 0 {
        info!(reminded, "Bill reminders sent");
    }
    Ok(reminded)
}

const GOAL_MILESTONES: [i64; 4] = [25, 50, 75, 100];

/// Celebrate goal progress milestones
///
/// Each milestone fires at most once per goal, keyed by the notification
/// title. Hitting 100% here also completes the goal, covering balances that
/// reached the target outside `add_contribution`.
pub fn check_goal_milestones(db: &Database, today: NaiveDate) -> Result<usize> {
    let mut created = 0;

    for user in db.list_users()? {
        for goal in db.list_goals(user.id)? {
            if goal.status != crate::models::GoalStatus::Active {
                continue;
            }
            let progress = goal.progress_percent();

            for milestone in GOAL_MILESTONES {
                if progress < milestone as f64 {
                    continue;
                }

                let (title, message) = if milestone == 100 {
                    (
                        format!("Goal Achieved: {}", goal.name),
                        format!(
                            "Congratulations! You've reached your savings goal of ${:.2}!",
                            goal.target_amount
                        ),
                    )
                } else {
                    (
                        format!("Milestone Reached: {}% of {}", milestone, goal.name),
                        format!(
                            "Great progress! You've saved ${:.2} towards your ${:.2} goal.",
                            goal.current_amount, goal.target_amount
                        ),
                    )
                };

                if db.notification_title_exists(goal.user_id, NotificationKind::GoalMilestone, &title)? {
                    continue;
                }

                if milestone == 100 {
                    db.set_goal_status(goal.id, crate::models::GoalStatus::Completed)?;
                }

                let prefs = db.get_preferences(goal.user_id)?;
                db.create_notification(
                    goal.user_id,
                    &title,
                    &message,
                    NotificationKind::GoalMilestone,
                    Priority::Medium,
                    today,
                )?;
                if prefs.goal_notifications {
                    queue_email(db, goal.user_id, &prefs, &title, &message)?;
                }
                created += 1;
            }
        }
    }

    if created > 0 {
        info!(created, "Goal milestone notifications created");
    }
    Ok(created)
}

/// Alert users whose trailing-week spending runs hot
///
/// Baseline is the daily average over [today-30, today-7), 23 days; the
/// alert fires when the trailing week's daily average exceeds 1.5x that,
/// at most once per user per week.
pub fn detect_unusual_spending(db: &Database, today: NaiveDate) -> Result<usize> {
    let week_ago = today - Duration::days(7);
    let month_ago = today - Duration::days(30);
    let mut alerted = 0;

    for user in db.list_users()? {
        let baseline_total =
            db.expenses_between(user.id, month_ago, week_ago - Duration::days(1))?;
        let baseline_daily = baseline_total / 23.0;
        if baseline_daily <= 0.0 {
            continue;
        }

        let week_total = db.expenses_between(user.id, week_ago, today)?;
        let week_daily = week_total / 7.0;
        if week_daily <= baseline_daily * 1.5 {
            continue;
        }

        if db.notification_exists_since(user.id, NotificationKind::UnusualSpending, week_ago)? {
            continue;
        }

        let increase = (week_daily - baseline_daily) / baseline_daily * 100.0;
        db.create_notification(
            user.id,
            "Unusual Spending Detected",
            &format!(
                "Your daily spending this week (${:.2}) is {:.0}% higher than usual (${:.2})",
                week_daily, increase, baseline_daily
            ),
            NotificationKind::UnusualSpending,
            Priority::Medium,
            today,
        )?;
        alerted += 1;
    }

    if alerted > 0 {
        info!(alerted, "Unusual spending alerts created");
    }
    Ok(alerted)
}

/// Summarize last month for users opted into monthly reports
///
/// Runs only on the first of the month. The title carries the month, so a
/// repeat run on the same day is a no-op.
pub fn generate_monthly_reports(db: &Database, today: NaiveDate) -> Result<usize> {
    if today.day() != 1 {
        return Ok(0);
    }

    let last_month = today - Duration::days(1);
    let mut sent = 0;

    for user in db.list_users()? {
        let prefs = db.get_preferences(user.id)?;
        if !prefs.monthly_reports || !prefs.email_notifications {
            continue;
        }

        let title = format!(
            "Monthly Report - {}",
            last_month.format("%B %Y")
        );
        if db.notification_title_exists(user.id, NotificationKind::MonthlySummary, &title)? {
            continue;
        }

        let totals = db.month_totals(user.id, last_month.year(), last_month.month())?;
        let score = db.get_health_score(user.id)?.map(|h| h.score).unwrap_or(0);
        let message = format!(
            "Monthly Financial Summary:\n\
             Income: ${:.2}\n\
             Expenses: ${:.2}\n\
             Net Savings: ${:.2}\n\
             Financial Health Score: {}/100",
            totals.income,
            totals.expenses,
            totals.net(),
            score
        );

        db.create_notification(
            user.id,
            &title,
            &message,
            NotificationKind::MonthlySummary,
            Priority::Low,
            today,
        )?;
        db.enqueue_email(user.id, &title, &message)?;
        sent += 1;
    }

    if sent > 0 {
        info!(sent, "Monthly reports generated");
    }
    Ok(sent)
}

/// Recompute and store every user's health score
pub fn recalculate_health_scores(db: &Database, today: NaiveDate) -> Result<usize> {
    let users = db.list_users()?;
    for user in &users {
        let breakdown = crate::metrics::health_score(db, user.id, today)?;
        db.upsert_health_score(
            user.id,
            breakdown.score,
            breakdown.savings_rate,
            breakdown.budget_adherence,
            breakdown.emergency_fund_months,
        )?;
    }

    debug!(users = users.len(), "Health scores recalculated");
    Ok(users.len())
}

/// Run the hourly job set: alerts, reminders, milestones
pub fn run_hourly(db: &Database, today: NaiveDate) -> Result<()> {
    run_logged("check_budget_alerts", || check_budget_alerts(db, today));
    run_logged("check_bill_reminders", || check_bill_reminders(db, today));
    run_logged("check_goal_milestones", || check_goal_milestones(db, today));
    Ok(())
}

/// Run the daily job set: recurring, health, unusual spending, reports
pub fn run_daily(db: &Database, today: NaiveDate) -> Result<()> {
    run_logged("apply_recurring", || apply_recurring(db, today));
    run_logged("recalculate_health_scores", || {
        recalculate_health_scores(db, today)
    });
    run_logged("detect_unusual_spending", || {
        detect_unusual_spending(db, today)
    });
    run_logged("generate_monthly_reports", || {
        generate_monthly_reports(db, today)
    });
    Ok(())
}

/// One job failing must not stop the rest of the batch
fn run_logged(name: &str, job: impl FnOnce() -> Result<usize>) {
    if let Err(e) = job() {
        warn!(job = name, error = %e, "Background job failed");
    }
}

fn queue_email(
    db: &Database,
    user_id: i64,
    prefs: &UserPreferences,
    subject: &str,
    body: &str,
) -> Result<()> {
    if prefs.email_notifications {
        db.enqueue_email(user_id, subject, body)?;
    }
    Ok(())
}
