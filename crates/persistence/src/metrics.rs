//! Query and pool metrics for the catalog database.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// `pool` label on the connection gauges.
const POOL_LABEL: &str = "catalog";

/// Times one named query.
///
/// Finish it with the query result so failed queries are labelled and
/// counted apart from successful ones:
/// ```ignore
/// let timer = QueryTimer::new("bind_application_recipient");
/// let result = sqlx::query_as::<_, ApplicationEntity>(...).fetch_optional(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records `database_query_duration_seconds{query, outcome}` and bumps
    /// `database_query_errors_total{query}` on failure.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        let outcome = outcome_label(result);
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if result.is_err() {
            counter!("database_query_errors_total", "query" => self.query).increment(1);
        }
    }
}

fn outcome_label<T, E>(result: &Result<T, E>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(_) => "error",
    }
}

/// Publishes pool occupancy gauges. Refreshed by the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(size);
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active", "pool" => POOL_LABEL).set(f64::from(active));
    gauge!("database_connections_idle", "pool" => POOL_LABEL).set(f64::from(idle));
    gauge!("database_connections_total", "pool" => POOL_LABEL).set(f64::from(size));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label::<(), ()>(&Ok(())), "ok");
        assert_eq!(outcome_label::<(), &str>(&Err("boom")), "error");
    }

    #[test]
    fn test_finish_without_recorder_is_a_no_op() {
        let timer = QueryTimer::new("bind_application_recipient");
        assert_eq!(timer.query, "bind_application_recipient");
        timer.finish::<u64, sqlx::Error>(&Err(sqlx::Error::RowNotFound));
    }
}
