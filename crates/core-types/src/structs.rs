use crate::enums::RequestStatus;
use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The write model for a new purchase request. The database generates the id;
/// everything else is supplied by the caller, including both date
/// representations (calendar conversion happens upstream of this layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    pub request_number: String,
    /// Local-calendar (Jalali) date, kept as the caller-formatted string.
    pub request_date_jalali: String,
    pub request_date_gregorian: NaiveDate,
    pub requesting_unit: String,
    pub requester_name: String,
    pub pdf_file_path: Option<String>,
    pub year: i32,
    pub month: i32,
    pub month_name: String,
    /// Defaults to `pending` when absent.
    pub status: Option<RequestStatus>,
}

impl NewRequest {
    /// Checks the caller-side contract before anything touches the database,
    /// so a missing field surfaces as a field error rather than a generic
    /// storage failure.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.request_number.trim().is_empty() {
            return Err(CoreError::MissingField("request_number"));
        }
        if self.request_date_jalali.trim().is_empty() {
            return Err(CoreError::MissingField("request_date_jalali"));
        }
        if self.requesting_unit.trim().is_empty() {
            return Err(CoreError::MissingField("requesting_unit"));
        }
        if self.requester_name.trim().is_empty() {
            return Err(CoreError::MissingField("requester_name"));
        }
        if self.month_name.trim().is_empty() {
            return Err(CoreError::MissingField("month_name"));
        }
        if !(1..=12).contains(&self.month) {
            return Err(CoreError::OutOfRange {
                field: "month",
                detail: format!("{} is not a calendar month", self.month),
            });
        }
        Ok(())
    }
}

/// The write model for a single line item. The owning request id is assigned
/// when the parent request is inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    /// Display/sort position within the request, unique per request.
    pub row_number: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Defaults to "Tehran" when absent.
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
}

/// Optional predicates for the filtered request search. Every field is ANDed;
/// `None` means "do not filter on this".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFilters {
    /// Exact match.
    pub request_number: Option<String>,
    /// Case-insensitive substring match.
    pub requester_name: Option<String>,
    /// Case-insensitive substring match.
    pub requesting_unit: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub status: Option<RequestStatus>,
    /// Inclusive lower bound on the Gregorian request date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the Gregorian request date.
    pub date_to: Option<NaiveDate>,
}

impl RequestFilters {
    pub fn is_empty(&self) -> bool {
        self.request_number.is_none()
            && self.requester_name.is_none()
            && self.requesting_unit.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.status.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// Counts of active (non-deleted) requests, overall and per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatistics {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
}

impl RequestStatistics {
    /// Folds one `(status, count)` row into the totals, keeping
    /// `total == pending + approved + rejected + completed`.
    pub fn record(&mut self, status: RequestStatus, count: i64) {
        match status {
            RequestStatus::Pending => self.pending += count,
            RequestStatus::Approved => self.approved += count,
            RequestStatus::Rejected => self.rejected += count,
            RequestStatus::Completed => self.completed += count,
        }
        self.total += count;
    }
}
