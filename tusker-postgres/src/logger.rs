use std::time::Instant;

/// Emits one debug record per adapter-level statement execution.
pub(crate) struct QueryLogger<'q> {
    sql: &'q str,
    rows_returned: u64,
    start: Instant,
}

impl<'q> QueryLogger<'q> {
    pub(crate) fn new(sql: &'q str) -> Self {
        Self { sql, rows_returned: 0, start: Instant::now() }
    }

    pub(crate) fn increment_rows_returned(&mut self) {
        self.rows_returned += 1;
    }

    pub(crate) fn finish(&self) {
        tracing::debug!(
            target: "tusker::query",
            statement = %parse_query_summary(self.sql),
            rows_returned = self.rows_returned,
            elapsed = ?self.start.elapsed(),
            "statement completed",
        );
    }
}

impl Drop for QueryLogger<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

fn parse_query_summary(sql: &str) -> String {
    // For now, just take the first 4 words
    sql.split_whitespace().take(4).collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_takes_the_leading_words() {
        assert_eq!(
            parse_query_summary("SELECT a, b FROM t WHERE x = 1"),
            "SELECT a, b FROM",
        );
        assert_eq!(parse_query_summary("SELECT 1"), "SELECT 1");
    }
}
