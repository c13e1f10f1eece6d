//! Predicate composition for the filtered request search.
//!
//! The searchable columns form a fixed, named set of clauses; each active
//! filter appends its clause text and binds its value through the builder, so
//! the SQL shape is decided here and user input only ever travels as a bind
//! parameter.

use core_types::RequestFilters;
use sqlx::{Postgres, QueryBuilder};

/// Appends ` AND <clause>` fragments for every active filter.
///
/// The builder is expected to already contain the SELECT/JOIN prefix ending in
/// a `WHERE` condition (the caller uses `WHERE 1 = 1` as the anchor).
pub fn apply_request_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &RequestFilters,
    include_deleted: bool,
) {
    if !include_deleted {
        builder.push(" AND pr.deleted_at IS NULL");
    }

    if let Some(number) = &filters.request_number {
        builder.push(" AND pr.request_number = ");
        builder.push_bind(number.clone());
    }

    if let Some(name) = &filters.requester_name {
        builder.push(" AND pr.requester_name ILIKE ");
        builder.push_bind(format!("%{name}%"));
    }

    if let Some(unit) = &filters.requesting_unit {
        builder.push(" AND pr.requesting_unit ILIKE ");
        builder.push_bind(format!("%{unit}%"));
    }

    if let Some(year) = filters.year {
        builder.push(" AND pr.year = ");
        builder.push_bind(year);
    }

    if let Some(month) = filters.month {
        builder.push(" AND pr.month = ");
        builder.push_bind(month);
    }

    if let Some(status) = filters.status {
        builder.push(" AND pr.status = ");
        builder.push_bind(status.as_str());
    }

    if let Some(from) = filters.date_from {
        builder.push(" AND pr.request_date_gregorian >= ");
        builder.push_bind(from);
    }

    if let Some(to) = filters.date_to {
        builder.push(" AND pr.request_date_gregorian <= ");
        builder.push_bind(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::RequestStatus;

    fn builder() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new("SELECT pr.id FROM purchase_requests pr WHERE 1 = 1")
    }

    #[test]
    fn no_filters_only_excludes_deleted_rows() {
        let mut qb = builder();
        apply_request_filters(&mut qb, &RequestFilters::default(), false);
        assert_eq!(
            qb.sql(),
            "SELECT pr.id FROM purchase_requests pr WHERE 1 = 1 AND pr.deleted_at IS NULL"
        );
    }

    #[test]
    fn include_deleted_drops_the_soft_delete_clause() {
        let mut qb = builder();
        apply_request_filters(&mut qb, &RequestFilters::default(), true);
        assert_eq!(
            qb.sql(),
            "SELECT pr.id FROM purchase_requests pr WHERE 1 = 1"
        );
    }

    #[test]
    fn every_filter_contributes_its_clause_with_ordered_placeholders() {
        let filters = RequestFilters {
            request_number: Some("1001".to_string()),
            requester_name: Some("Hosseini".to_string()),
            requesting_unit: Some("IT".to_string()),
            year: Some(1403),
            month: Some(5),
            status: Some(RequestStatus::Pending),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 12, 31),
        };

        let mut qb = builder();
        apply_request_filters(&mut qb, &filters, false);
        let sql = qb.sql();

        assert!(sql.contains("pr.request_number = $1"));
        assert!(sql.contains("pr.requester_name ILIKE $2"));
        assert!(sql.contains("pr.requesting_unit ILIKE $3"));
        assert!(sql.contains("pr.year = $4"));
        assert!(sql.contains("pr.month = $5"));
        assert!(sql.contains("pr.status = $6"));
        assert!(sql.contains("pr.request_date_gregorian >= $7"));
        assert!(sql.contains("pr.request_date_gregorian <= $8"));
    }

    #[test]
    fn substring_input_never_lands_in_the_sql_text() {
        let filters = RequestFilters {
            requester_name: Some("'; DROP TABLE purchase_requests; --".to_string()),
            ..Default::default()
        };

        let mut qb = builder();
        apply_request_filters(&mut qb, &filters, false);
        assert!(!qb.sql().contains("DROP TABLE"));
    }
}
