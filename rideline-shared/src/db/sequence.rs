/// Transactional sequence allocator
///
/// Entity ids in Rideline are not database serials: they come from named
/// counter rows in the `sequences` table, incremented inside a transaction.
/// Each successful allocation increases a counter by exactly one and no value
/// is ever handed out twice, even under concurrent allocation from independent
/// processes. Values allocated for work that later aborts are simply burned —
/// gaps are tolerated, duplicates are not.
///
/// # How allocation works
///
/// 1. Begin a transaction
/// 2. `SELECT ... FOR UPDATE` the counter row (a missing row counts as 0)
/// 3. Write back `current + 1` (creating the row on first use)
/// 4. Commit and return the new value
///
/// The row lock serializes increments for the same sequence name. Two racing
/// first-time allocations can still collide on the insert, and the store may
/// abort a transaction with a serialization or deadlock failure; those
/// outcomes are retried with bounded attempts before surfacing
/// [`SequenceError::StoreUnavailable`].
///
/// # Example
///
/// ```no_run
/// use rideline_shared::db::sequence::{SequenceAllocator, USER_SEQ};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let sequences = SequenceAllocator::new(pool);
/// let id = sequences.allocate(USER_SEQ).await?;
/// assert!(id >= 1);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::{debug, warn};

/// Sequence feeding user ids
pub const USER_SEQ: &str = "user_seq";

/// Sequence feeding address ids
pub const ADDRESS_SEQ: &str = "address_seq";

/// Sequence feeding rider vehicle ids
pub const RIDER_SEQ: &str = "rider_seq";

/// Default number of attempts before an allocation gives up
const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Error type for sequence allocation
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// The sequence name was empty
    #[error("sequence name must not be empty")]
    EmptyName,

    /// The counter transaction could not be completed
    #[error("sequence store unavailable after {attempts} attempt(s): {source}")]
    StoreUnavailable {
        /// How many attempts were made before giving up
        attempts: u32,

        /// The last database error observed
        #[source]
        source: sqlx::Error,
    },
}

/// Issues strictly increasing integer ids per named sequence
///
/// Cheap to clone; the pool is reference-counted.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    pool: PgPool,
    max_attempts: u32,
}

impl SequenceAllocator {
    /// Creates an allocator with the default retry budget
    pub fn new(pool: PgPool) -> Self {
        Self::with_max_attempts(pool, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates an allocator with an explicit retry budget
    ///
    /// `max_attempts` is clamped to at least 1.
    pub fn with_max_attempts(pool: PgPool, max_attempts: u32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocates the next value of the named sequence
    ///
    /// The counter row is created lazily on first allocation and never
    /// deleted. The returned value starts at 1.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::EmptyName`] if `sequence` is empty
    /// - [`SequenceError::StoreUnavailable`] if the counter transaction cannot
    ///   be committed within the retry budget
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rideline_shared::db::sequence::{SequenceAllocator, ADDRESS_SEQ};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    /// let sequences = SequenceAllocator::new(pool);
    /// let first = sequences.allocate(ADDRESS_SEQ).await?;
    /// let second = sequences.allocate(ADDRESS_SEQ).await?;
    /// assert_eq!(second, first + 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn allocate(&self, sequence: &str) -> Result<i64, SequenceError> {
        if sequence.is_empty() {
            return Err(SequenceError::EmptyName);
        }

        let mut attempt = 1;
        loop {
            match self.try_allocate(sequence).await {
                Ok(value) => {
                    debug!(sequence, value, attempt, "Allocated sequence value");
                    return Ok(value);
                }
                Err(err) if is_retryable(&err) && attempt < self.max_attempts => {
                    debug!(
                        sequence,
                        attempt,
                        error = %err,
                        "Sequence transaction aborted, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        sequence,
                        attempts = attempt,
                        error = %err,
                        "Sequence allocation failed"
                    );
                    return Err(SequenceError::StoreUnavailable {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    /// One read-modify-write attempt against the counter row
    async fn try_allocate(&self, sequence: &str) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT value FROM sequences WHERE name = $1 FOR UPDATE")
                .bind(sequence)
                .fetch_optional(&mut *tx)
                .await?;

        let next = current.unwrap_or(0) + 1;

        sqlx::query(
            r#"
            INSERT INTO sequences (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(sequence)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(next)
    }
}

/// Whether a failed attempt is worth retrying
///
/// Covers the store aborting one of two racing transactions (serialization
/// failure, deadlock) and two first-time allocations racing to insert the
/// counter row (unique violation).
fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some("40001") | Some("40P01") | Some("23505")
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_name_rejected() {
        // allocate() checks the name before touching the pool, so a
        // disconnected lazy pool is fine here
        let pool = PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let sequences = SequenceAllocator::new(pool);

        let err = sequences.allocate("").await.unwrap_err();
        assert!(matches!(err, SequenceError::EmptyName));
        assert_eq!(err.to_string(), "sequence name must not be empty");
    }

    #[tokio::test]
    async fn test_max_attempts_clamped() {
        let pool = PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let sequences = SequenceAllocator::with_max_attempts(pool, 0);
        assert_eq!(sequences.max_attempts, 1);
    }

    #[test]
    fn test_sequence_names() {
        assert_eq!(USER_SEQ, "user_seq");
        assert_eq!(ADDRESS_SEQ, "address_seq");
        assert_eq!(RIDER_SEQ, "rider_seq");
    }

    // Allocation behavior (monotonicity, concurrency, retry) is covered by
    // the database-backed tests in tests/sequence_tests.rs.
}
