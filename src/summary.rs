use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::decimal::Money;
use crate::errors::Result;
use crate::status::{resolve_installment_status, resolve_note_status};
use crate::types::{CustomerId, Eligibility, InstallmentId, NoteId, Status};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub paid: u32,
    pub overdue: u32,
    pub paid_late: u32,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::Paid => self.paid += 1,
            Status::Overdue => self.overdue += 1,
            Status::PaidLate => self.paid_late += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.pending + self.paid + self.overdue + self.paid_late
    }
}

/// earliest open debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDue {
    pub note_id: NoteId,
    pub installment_id: Option<InstallmentId>,
    pub number: Option<u32>,
    pub due_date: DateTime<Utc>,
    pub amount_due: Money,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsView {
    pub face_value: Money,
    pub paid: Money,
    pub outstanding: Money,
    pub overdue_amount: Money,
}

/// serializable view of a customer's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatement {
    pub customer_id: CustomerId,
    pub name: String,
    pub eligibility: Eligibility,
    pub as_of: DateTime<Utc>,
    pub totals: TotalsView,
    pub notes: StatusCounts,
    pub installments: StatusCounts,
    pub next_due: Option<NextDue>,
}

impl CustomerStatement {
    /// statuses are resolved fresh at `now`, not read from the caches
    pub fn from_customer(customer: &Customer, now: DateTime<Utc>) -> Self {
        let mut face_value = Money::ZERO;
        let mut paid = Money::ZERO;
        let mut overdue_amount = Money::ZERO;
        let mut notes = StatusCounts::default();
        let mut installments = StatusCounts::default();
        let mut next_due: Option<NextDue> = None;

        let mut consider = |candidate: NextDue| {
            let earlier = next_due
                .as_ref()
                .map_or(true, |current| candidate.due_date < current.due_date);
            if earlier {
                next_due = Some(candidate);
            }
        };

        for note in &customer.notes {
            face_value += note.amount;
            paid += note.amount_paid;

            let note_status = resolve_note_status(note, now);
            notes.record(note_status);

            if note.installment {
                for installment in &note.installments {
                    let status = resolve_installment_status(installment, now);
                    installments.record(status);

                    if status == Status::Overdue {
                        overdue_amount += installment.remaining();
                    }
                    if !status.is_settled() {
                        consider(NextDue {
                            note_id: note.id,
                            installment_id: Some(installment.id),
                            number: Some(installment.number),
                            due_date: installment.due_date,
                            amount_due: installment.remaining(),
                            overdue: status == Status::Overdue,
                        });
                    }
                }
            } else if !note_status.is_settled() {
                if note_status == Status::Overdue {
                    overdue_amount += note.remaining();
                }
                consider(NextDue {
                    note_id: note.id,
                    installment_id: None,
                    number: None,
                    due_date: note.due_date,
                    amount_due: note.remaining(),
                    overdue: note_status == Status::Overdue,
                });
            }
        }

        CustomerStatement {
            customer_id: customer.id,
            name: customer.name.clone(),
            eligibility: customer.eligibility,
            as_of: now,
            totals: TotalsView {
                face_value,
                paid,
                outstanding: face_value.saturating_sub(paid),
                overdue_amount,
            },
            notes,
            installments,
            next_due,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::customer::NewCustomer;
    use crate::ids::SequentialIds;
    use crate::note::{Note, NoteDraft};
    use crate::payments::{pay_note, PaymentMeta};
    use crate::types::PaymentMethod;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn customer_with_notes(ids: &SequentialIds) -> Customer {
        let mut customer = Customer::register(Uuid::nil(), NewCustomer::named("Paula"), issued()).unwrap();
        let config = LedgerConfig::default();

        let split = Note::issue(
            &NoteDraft::split(Money::from_major(300), issued(), 3),
            customer.id,
            &config,
            ids,
            issued(),
        )
        .unwrap();
        let single = Note::issue(
            &NoteDraft::single(Money::from_major(50), issued(), issued() + Duration::days(90)),
            customer.id,
            &config,
            ids,
            issued(),
        )
        .unwrap();

        customer.notes = vec![split, single];
        customer
    }

    #[test]
    fn test_totals_and_counts() {
        let ids = SequentialIds::new();
        let mut customer = customer_with_notes(&ids);

        let meta = PaymentMeta::new(PaymentMethod::Pix);
        let paid = pay_note(&customer.notes[0], Money::from_major(150), &meta, &ids, issued()).unwrap();
        customer.notes[0] = paid.note;

        // second installment is due 2024-03-10 and still half open
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let statement = CustomerStatement::from_customer(&customer, now);

        assert_eq!(statement.totals.face_value, Money::from_major(350));
        assert_eq!(statement.totals.paid, Money::from_major(150));
        assert_eq!(statement.totals.outstanding, Money::from_major(200));
        assert_eq!(statement.totals.overdue_amount, Money::from_major(50));

        assert_eq!(statement.installments.paid, 1);
        assert_eq!(statement.installments.overdue, 1);
        assert_eq!(statement.installments.pending, 1);
        assert_eq!(statement.notes.overdue, 1);
        assert_eq!(statement.notes.pending, 1);
        assert_eq!(statement.notes.total(), 2);

        let next = statement.next_due.unwrap();
        assert_eq!(next.number, Some(2));
        assert_eq!(next.amount_due, Money::from_major(50));
        assert!(next.overdue);
    }

    #[test]
    fn test_empty_customer() {
        let customer = Customer::register(Uuid::nil(), NewCustomer::named("Rui"), issued()).unwrap();
        let statement = CustomerStatement::from_customer(&customer, issued());

        assert_eq!(statement.totals.outstanding, Money::ZERO);
        assert_eq!(statement.notes.total(), 0);
        assert!(statement.next_due.is_none());
    }

    #[test]
    fn test_json_shape() {
        let ids = SequentialIds::new();
        let customer = customer_with_notes(&ids);
        let json = CustomerStatement::from_customer(&customer, issued())
            .to_json_pretty()
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["face_value"].as_str().map(|s| s.parse::<Money>().unwrap()), Some(Money::from_major(350)));
        assert_eq!(value["next_due"]["number"], 1);
    }
}
