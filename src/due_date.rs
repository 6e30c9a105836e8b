//! Works out when the next payment towards an obligation falls due.

use crate::{
    calendar::{add_months, first_of_month, month_length, today},
    Obligation, Payment, Schedule,
};
use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, trace, warn};
use std::convert::TryFrom;

/// Returns the date of the next unpaid installment of `obligation`, or `None` once it
/// is settled.
///
/// `history` holds the payments recorded so far; payments belonging to other
/// obligations are ignored. `now` allows overriding the current date, which only
/// matters for day-of-month schedules.
///
/// A schedule missing its anchor (first installment date, start date or payment day)
/// can't produce a date. That is logged as a warning and treated as "no due date"
/// rather than an error.
pub fn next_due_date(
    obligation: &Obligation,
    history: &[Payment],
    now: Option<NaiveDate>,
) -> Option<NaiveDate> {
    if obligation.is_settled() {
        trace!("obligation {} is settled", obligation.id);
        return None;
    }

    match obligation.schedule {
        Schedule::FixedDate { due_date } => Some(due_date),
        Schedule::InstallmentByCount {
            first_installment_date,
            paid_installments,
            ..
        } => {
            let first = match first_installment_date {
                Some(d) => d,
                None => {
                    warn!(
                        "obligation {} has installments but no first installment date",
                        obligation.id
                    );
                    return None;
                }
            };

            let paid = paid_count(obligation, history, paid_installments);
            let due = add_months(first, i32::try_from(paid).unwrap_or(i32::MAX));

            debug!(
                "obligation {}: {} installments paid since {}, next due {}",
                obligation.id, paid, first, due
            );

            Some(due)
        }
        Schedule::InstallmentByDayOfMonth {
            start_date,
            payment_day,
            last_payment_date,
        } => {
            let (start, day) = match (start_date, payment_day) {
                (Some(s), Some(d)) if (1..=31).contains(&d) => (s, d),
                _ => {
                    warn!(
                        "obligation {} has a monthly schedule without a valid start date or payment day",
                        obligation.id
                    );
                    return None;
                }
            };

            let now = now.unwrap_or_else(today);
            Some(next_day_of_month_due(start, day, last_payment_date, now))
        }
    }
}

/// Returns whether the next installment of `obligation` was due before `now`.
pub fn is_overdue(obligation: &Obligation, history: &[Payment], now: Option<NaiveDate>) -> bool {
    let now = now.unwrap_or_else(today);
    match next_due_date(obligation, history, Some(now)) {
        Some(due) => due < now,
        None => false,
    }
}

/// Resolves the next occurrence of `payment_day` for a schedule that started on
/// `start_date`.
///
/// Before the start date, this is the first occurrence on or after the start date.
/// Afterwards it's this month's occurrence if it hasn't passed, otherwise next
/// month's. If `last_payment` already falls within the resolved month, that cycle has
/// been paid and the following month is returned. Payment days beyond the end of a
/// month fall on the month's last day.
pub fn next_day_of_month_due(
    start_date: NaiveDate,
    payment_day: u32,
    last_payment: Option<NaiveDate>,
    now: NaiveDate,
) -> NaiveDate {
    let anchor = if start_date > now { start_date } else { now };
    let mut due = occurrence_on_or_after(anchor, payment_day);

    if let Some(last) = last_payment {
        if last.year() == due.year() && last.month() == due.month() {
            trace!("payment on {} already covers {}", last, due);
            due = occurrence_in_month(add_months(first_of_month(due), 1), payment_day);
        }
    }

    due
}

// The installment count comes from the recorded history when there is one, and from
// the stored counter otherwise (e.g. records that predate payment tracking).
fn paid_count(obligation: &Obligation, history: &[Payment], stored: Option<u32>) -> u32 {
    let recorded = history
        .iter()
        .filter(|p| p.obligation_id == obligation.id)
        .count();
    let recorded = u32::try_from(recorded).unwrap_or(u32::MAX);
    let stored = stored.unwrap_or(0);

    if recorded == 0 {
        return stored;
    }

    if recorded != stored {
        debug!(
            "obligation {} records {} payments but stores {} paid installments",
            obligation.id, recorded, stored
        );
    }

    recorded
}

fn occurrence_in_month(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.max(1).min(month_length(date));
    first_of_month(date) + Duration::days(day as i64 - 1)
}

fn occurrence_on_or_after(date: NaiveDate, day: u32) -> NaiveDate {
    let this_month = occurrence_in_month(date, day);
    if this_month >= date {
        this_month
    } else {
        occurrence_in_month(add_months(first_of_month(date), 1), day)
    }
}
