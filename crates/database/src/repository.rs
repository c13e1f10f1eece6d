use crate::error::DbError;
use crate::filter::apply_request_filters;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{NewItem, NewRequest, RequestFilters, RequestStatistics, RequestStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::{FromRow, Postgres, QueryBuilder};

/// Purchase location stored for an item when the caller supplies none.
pub const DEFAULT_PURCHASE_LOCATION: &str = "Tehran";

/// The `RequestRepository` provides a high-level, application-specific
/// interface to the database. It encapsulates all SQL queries and data access
/// logic for purchase requests and their line items.
#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

/// A row from the `purchase_requests` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub id: i64,
    pub request_number: String,
    pub request_date_jalali: String,
    pub request_date_gregorian: NaiveDate,
    pub requesting_unit: String,
    pub requester_name: String,
    pub pdf_file_path: Option<String>,
    pub year: i32,
    pub month: i32,
    pub month_name: String,
    pub status: String,
    /// Set when the request is soft-deleted; `None` means active.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `request_items` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RequestItem {
    pub id: i64,
    pub request_id: i64,
    pub row_number: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub purchase_location: String,
    pub notes: Option<String>,
}

/// A request together with its items, ordered by `row_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestWithItems {
    pub request: PurchaseRequest,
    pub items: Vec<RequestItem>,
}

/// The identifying fields of the active request holding a contested number,
/// returned by the duplicate preflight check.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DuplicateRequest {
    pub id: i64,
    pub request_number: String,
    pub request_date_jalali: String,
    pub requesting_unit: String,
    pub requester_name: String,
    pub status: String,
}

/// One matching item from the free-text item search, joined back to its
/// parent request.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemMatch {
    pub id: i64,
    pub request_number: String,
    pub request_date_jalali: String,
    pub request_date_gregorian: NaiveDate,
    pub requesting_unit: String,
    pub requester_name: String,
    pub pdf_file_path: Option<String>,
    pub status: String,
    pub matched_description: String,
    pub matched_notes: Option<String>,
    pub row_number: i32,
}

/// A search result row: the request columns plus its item count from the
/// left-joined aggregation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RequestOverview {
    pub id: i64,
    pub request_number: String,
    pub request_date_jalali: String,
    pub request_date_gregorian: NaiveDate,
    pub requesting_unit: String,
    pub requester_name: String,
    pub pdf_file_path: Option<String>,
    pub year: i32,
    pub month: i32,
    pub month_name: String,
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items_count: i64,
}

const REQUEST_COLUMNS: &str = "id, request_number, request_date_jalali, request_date_gregorian, \
     requesting_unit, requester_name, pdf_file_path, year, month, month_name, \
     status, deleted_at, created_at";

impl RequestRepository {
    /// Creates a new `RequestRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Saves a request and its items as one atomic unit.
    ///
    /// The request row is inserted first to obtain the generated id, then all
    /// items go in as a single batched INSERT carrying that id. The
    /// transaction commits only after both steps succeed; any failure rolls
    /// the whole thing back, so readers never observe a request without its
    /// items or vice versa. An empty item list is valid.
    ///
    /// Callers are expected to run `check_duplicate_request_number` first for
    /// a friendly preflight; the partial unique index on active request
    /// numbers still closes the race, surfacing `ConstraintViolation` to the
    /// losing writer.
    pub async fn save_request(
        &self,
        request: &NewRequest,
        items: &[NewItem],
    ) -> Result<i64, DbError> {
        request.validate()?;
        let status = request.status.unwrap_or(RequestStatus::Pending);

        let mut tx = self.pool.begin().await?;

        let request_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_requests
                (request_number, request_date_jalali, request_date_gregorian,
                 requesting_unit, requester_name, pdf_file_path,
                 year, month, month_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&request.request_number)
        .bind(&request.request_date_jalali)
        .bind(request.request_date_gregorian)
        .bind(&request.requesting_unit)
        .bind(&request.requester_name)
        .bind(&request.pdf_file_path)
        .bind(request.year)
        .bind(request.month)
        .bind(&request.month_name)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if !items.is_empty() {
            let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO request_items \
                 (request_id, row_number, description, quantity, unit, purchase_location, notes) ",
            );
            builder.push_values(items, |mut row, item| {
                row.push_bind(request_id)
                    .push_bind(item.row_number)
                    .push_bind(&item.description)
                    .push_bind(item.quantity)
                    .push_bind(&item.unit)
                    .push_bind(
                        item.purchase_location
                            .as_deref()
                            .unwrap_or(DEFAULT_PURCHASE_LOCATION),
                    )
                    .push_bind(&item.notes);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            request_number = %request.request_number,
            request_id,
            items = items.len(),
            "purchase request saved"
        );
        Ok(request_id)
    }

    /// Fetches a request and its items; `None` when the id is unknown.
    pub async fn get_request_by_id(
        &self,
        request_id: i64,
    ) -> Result<Option<RequestWithItems>, DbError> {
        let request = sqlx::query_as::<_, PurchaseRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM purchase_requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let items = self.get_request_items(request_id).await?;
        Ok(Some(RequestWithItems { request, items }))
    }

    /// Fetches a request by its business number. Deleted rows may share a
    /// number with one active row, so the active one wins; among deleted
    /// rows the most recent wins.
    pub async fn get_request_by_number(
        &self,
        request_number: &str,
    ) -> Result<Option<PurchaseRequest>, DbError> {
        let request = sqlx::query_as::<_, PurchaseRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM purchase_requests \
             WHERE request_number = $1 \
             ORDER BY (deleted_at IS NULL) DESC, id DESC \
             LIMIT 1"
        ))
        .bind(request_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Fetches the items of a request, ordered by `row_number`. An unknown
    /// request id yields an empty list.
    pub async fn get_request_items(&self, request_id: i64) -> Result<Vec<RequestItem>, DbError> {
        let items = sqlx::query_as::<_, RequestItem>(
            "SELECT id, request_id, row_number, description, quantity, unit, \
                    purchase_location, notes \
             FROM request_items WHERE request_id = $1 ORDER BY row_number",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Returns the active request already holding `request_number`, if any.
    /// Soft-deleted rows do not count as conflicts.
    pub async fn check_duplicate_request_number(
        &self,
        request_number: &str,
    ) -> Result<Option<DuplicateRequest>, DbError> {
        let existing = sqlx::query_as::<_, DuplicateRequest>(
            "SELECT id, request_number, request_date_jalali, \
                    requesting_unit, requester_name, status \
             FROM purchase_requests \
             WHERE request_number = $1 AND deleted_at IS NULL",
        )
        .bind(request_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing)
    }

    /// The highest numeric request number across all rows (including deleted
    /// ones, so a restored request can never collide with a suggestion).
    /// Rows whose number is not purely numeric are skipped.
    pub async fn get_max_request_number(&self) -> Result<Option<i64>, DbError> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(request_number::BIGINT) FROM purchase_requests \
             WHERE request_number ~ '^[0-9]+$'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// Hard-deletes a request; the `ON DELETE CASCADE` referential action
    /// removes its items in the same statement.
    pub async fn delete_request(&self, request_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM purchase_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        tracing::info!(request_id, "purchase request deleted");
        Ok(())
    }

    /// Marks an active request as deleted. Fails with `NotFound` when the id
    /// is unknown or the request is already deleted.
    pub async fn soft_delete_request(&self, request_id: i64) -> Result<(), DbError> {
        let number: Option<String> = sqlx::query_scalar(
            "UPDATE purchase_requests SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING request_number",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        match number {
            Some(number) => {
                tracing::info!(request_id, request_number = %number, "purchase request soft-deleted");
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    /// Clears the soft-delete timestamp. Fails with `NotFound` when the id is
    /// unknown or the request is not currently deleted, so restoring an
    /// already-active request is an error rather than a silent no-op.
    pub async fn restore_request(&self, request_id: i64) -> Result<(), DbError> {
        let number: Option<String> = sqlx::query_scalar(
            "UPDATE purchase_requests SET deleted_at = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING request_number",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        match number {
            Some(number) => {
                tracing::info!(request_id, request_number = %number, "purchase request restored");
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    /// Transitions a request to a new status.
    ///
    /// The value is validated against the closed status set before any
    /// statement is issued; an invalid value produces a `Validation` error
    /// listing the accepted values and leaves storage untouched. Zero matched
    /// rows map to `NotFound`.
    pub async fn update_status(&self, request_id: i64, new_status: &str) -> Result<(), DbError> {
        let status: RequestStatus = new_status.parse()?;

        let number: Option<String> = sqlx::query_scalar(
            "UPDATE purchase_requests SET status = $1 WHERE id = $2 RETURNING request_number",
        )
        .bind(status.as_str())
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        match number {
            Some(number) => {
                tracing::info!(request_id, request_number = %number, status = %status, "status updated");
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    /// Case-insensitive substring search over item descriptions and notes,
    /// joined back to the parent request. Results are ordered by request date
    /// (newest first), then by `row_number` within a request.
    pub async fn search_in_items(&self, search_text: &str) -> Result<Vec<ItemMatch>, DbError> {
        let pattern = format!("%{search_text}%");

        let matches = sqlx::query_as::<_, ItemMatch>(
            r#"
            SELECT
                pr.id,
                pr.request_number,
                pr.request_date_jalali,
                pr.request_date_gregorian,
                pr.requesting_unit,
                pr.requester_name,
                pr.pdf_file_path,
                pr.status,
                ri.description AS matched_description,
                ri.notes AS matched_notes,
                ri.row_number
            FROM purchase_requests pr
            INNER JOIN request_items ri ON ri.request_id = pr.id
            WHERE ri.description ILIKE $1 OR ri.notes ILIKE $1
            ORDER BY pr.request_date_gregorian DESC, ri.row_number
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    /// Filtered request search. Soft-deleted rows are excluded unless
    /// `include_deleted` is set; each row carries its item count from a
    /// left-joined aggregation; results are ordered by request number,
    /// descending.
    pub async fn search_requests(
        &self,
        filters: &RequestFilters,
        include_deleted: bool,
    ) -> Result<Vec<RequestOverview>, DbError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT pr.id, pr.request_number, pr.request_date_jalali, \
                    pr.request_date_gregorian, pr.requesting_unit, pr.requester_name, \
                    pr.pdf_file_path, pr.year, pr.month, pr.month_name, pr.status, \
                    pr.deleted_at, pr.created_at, \
                    COUNT(ri.id) AS items_count \
             FROM purchase_requests pr \
             LEFT JOIN request_items ri ON ri.request_id = pr.id \
             WHERE 1 = 1",
        );

        apply_request_filters(&mut builder, filters, include_deleted);
        builder.push(" GROUP BY pr.id ORDER BY pr.request_number DESC");

        let rows = builder
            .build_query_as::<RequestOverview>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Counts active requests, overall and per status.
    ///
    /// Infallible by contract: when the store is unreachable the caller gets
    /// zeroed counts (and a warning in the log) rather than an error, so a
    /// dashboard render never fails on statistics alone.
    pub async fn get_statistics(&self) -> RequestStatistics {
        match self.load_statistics().await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(error = %err, "statistics query failed, returning zeroed counts");
                RequestStatistics::default()
            }
        }
    }

    async fn load_statistics(&self) -> Result<RequestStatistics, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM purchase_requests \
             WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = RequestStatistics::default();
        for (status, count) in rows {
            match status.parse::<RequestStatus>() {
                Ok(status) => stats.record(status, count),
                // The CHECK constraint keeps this unreachable; tolerate it anyway.
                Err(_) => tracing::warn!(%status, "unknown status value in store"),
            }
        }

        Ok(stats)
    }

    /// Round-trips a trivial query to verify the pool is usable.
    pub async fn ping(&self) -> Result<(), DbError> {
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&self.pool)
            .await?;
        tracing::debug!(%version, "connection test succeeded");
        Ok(())
    }
}
