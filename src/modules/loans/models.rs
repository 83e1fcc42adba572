use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::modules::books::models::{Book, BookId};

/// Opaque identifier assigned to a loan on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub u64);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A loan of one book to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub loan_date: Date,
    /// Unset until the first return update
    pub returned: Option<bool>,
}

impl Loan {
    /// A loan is active until it is marked returned.
    pub fn is_active(&self) -> bool {
        self.returned != Some(true)
    }

    /// Active and taken on or before `cutoff`.
    pub fn is_late(&self, cutoff: Date) -> bool {
        self.is_active() && self.loan_date <= cutoff
    }

    /// Address used for notices: the email, or the customer's name when none was given.
    pub fn recipient(&self) -> &str {
        self.customer_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .unwrap_or(&self.customer_name)
    }
}

/// A loan ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub loan_date: Date,
}

/// Request model for lending a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub isbn: String,
    pub customer: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request model for recording a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub returned: bool,
}

/// Loan as presented to API clients, with the loaned book attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub book: Option<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn loan(returned: Option<bool>, email: Option<&str>) -> Loan {
        Loan {
            id: LoanId(1),
            book_id: BookId(1),
            customer_name: "Alice".into(),
            customer_email: email.map(str::to_string),
            loan_date: date!(2024 - 02 - 01),
            returned,
        }
    }

    #[test]
    fn unset_and_false_are_active() {
        assert!(loan(None, None).is_active());
        assert!(loan(Some(false), None).is_active());
        assert!(!loan(Some(true), None).is_active());
    }

    #[test]
    fn lateness_includes_cutoff_day() {
        let loan = loan(None, None);
        assert!(loan.is_late(date!(2024 - 02 - 01)));
        assert!(!loan.is_late(date!(2024 - 01 - 31)));
    }

    #[test]
    fn recipient_falls_back_to_name() {
        assert_eq!(loan(None, Some("a@b.org")).recipient(), "a@b.org");
        assert_eq!(loan(None, None).recipient(), "Alice");
        assert_eq!(loan(None, Some(" ")).recipient(), "Alice");
    }

    #[test]
    fn view_flattens_loan_fields() {
        let view = LoanView {
            loan: loan(None, None),
            book: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["loan_date"], "2024-02-01");
        assert!(json["returned"].is_null());
    }
}
