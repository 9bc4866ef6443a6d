use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A previously computed comedy score for one article.
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub url: String,
    pub title: String,
    pub score: i64,
    pub rationale: String,
    pub cached_at: DateTime<Utc>,
}

/// Persistent article-score cache with time-based expiry.
///
/// Scoring an article costs a generative call, so results are kept across
/// process runs in SQLite, keyed by URL. A record counts as live while it is
/// younger than the TTL; expired records read as absent and are deleted by
/// `purge_expired`, which callers run opportunistically after a batch.
pub struct ScoreCache {
    conn: Connection,
    ttl: Duration,
}

impl ScoreCache {
    pub fn open(path: impl AsRef<Path>, ttl_days: i64) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!("Failed to open score cache at {}", path.as_ref().display())
        })?;
        Self::with_connection(conn, ttl_days)
    }

    /// In-memory cache, used by tests and dry runs.
    pub fn open_in_memory(ttl_days: i64) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory cache")?;
        Self::with_connection(conn, ttl_days)
    }

    fn with_connection(conn: Connection, ttl_days: i64) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS article_scores (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                score INTEGER NOT NULL,
                rationale TEXT NOT NULL,
                cached_at INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create article_scores table")?;

        Ok(Self {
            conn,
            ttl: Duration::days(ttl_days),
        })
    }

    /// Look up a live record. Expired records read as absent.
    pub fn get(&self, url: &str) -> Result<Option<ScoreRecord>> {
        let cutoff = (Utc::now() - self.ttl).timestamp();

        self.conn
            .query_row(
                "SELECT url, title, score, rationale, cached_at
                 FROM article_scores
                 WHERE url = ?1 AND cached_at > ?2",
                params![url, cutoff],
                Self::row_to_record,
            )
            .optional()
            .context("Failed to query score cache")
    }

    /// Insert or overwrite the record for this URL. Last write wins; there
    /// is no merging of old and new scores.
    pub fn put(&self, url: &str, title: &str, score: i64, rationale: &str) -> Result<()> {
        self.put_at(url, title, score, rationale, Utc::now())
    }

    fn put_at(
        &self,
        url: &str,
        title: &str,
        score: i64,
        rationale: &str,
        cached_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO article_scores (url, title, score, rationale, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![url, title, score, rationale, cached_at.timestamp()],
            )
            .context("Failed to write score to cache")?;
        Ok(())
    }

    /// All live records, highest score first.
    pub fn all_live(&self) -> Result<Vec<ScoreRecord>> {
        let cutoff = (Utc::now() - self.ttl).timestamp();

        let mut stmt = self
            .conn
            .prepare(
                "SELECT url, title, score, rationale, cached_at
                 FROM article_scores
                 WHERE cached_at > ?1
                 ORDER BY score DESC",
            )
            .context("Failed to prepare cache listing")?;

        let records = stmt
            .query_map(params![cutoff], Self::row_to_record)
            .context("Failed to list score cache")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read score cache rows")?;

        Ok(records)
    }

    /// Delete every record older than the TTL.
    pub fn purge_expired(&self) -> Result<usize> {
        let cutoff = (Utc::now() - self.ttl).timestamp();

        let removed = self
            .conn
            .execute(
                "DELETE FROM article_scores WHERE cached_at <= ?1",
                params![cutoff],
            )
            .context("Failed to purge expired cache entries")?;

        Ok(removed)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoreRecord> {
        let cached_at: i64 = row.get(4)?;
        Ok(ScoreRecord {
            url: row.get(0)?,
            title: row.get(1)?,
            score: row.get(2)?,
            rationale: row.get(3)?,
            cached_at: DateTime::from_timestamp(cached_at, 0).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_record() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        cache.put("https://ex.com/a", "Toasters", 9, "absurd premise").unwrap();

        let record = cache.get("https://ex.com/a").unwrap().unwrap();
        assert_eq!(record.score, 9);
        assert_eq!(record.rationale, "absurd premise");
        assert_eq!(record.title, "Toasters");
    }

    #[test]
    fn missing_url_is_absent() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        assert!(cache.get("https://ex.com/nope").unwrap().is_none());
    }

    #[test]
    fn rescoring_overwrites_not_merges() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        cache.put("https://ex.com/a", "Toasters", 3, "meh").unwrap();
        cache.put("https://ex.com/a", "Toasters", 8, "on reflection, great").unwrap();

        let record = cache.get("https://ex.com/a").unwrap().unwrap();
        assert_eq!(record.score, 8);
        assert_eq!(record.rationale, "on reflection, great");
    }

    #[test]
    fn expired_record_reads_as_absent() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let stale = Utc::now() - Duration::days(8);
        cache
            .put_at("https://ex.com/old", "Old news", 9, "was funny once", stale)
            .unwrap();

        assert!(cache.get("https://ex.com/old").unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_expired_rows() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let stale = Utc::now() - Duration::days(8);
        cache
            .put_at("https://ex.com/old", "Old", 5, "stale", stale)
            .unwrap();
        cache.put("https://ex.com/new", "New", 6, "fresh").unwrap();

        let removed = cache.purge_expired().unwrap();
        assert_eq!(removed, 1);
        assert!(cache.get("https://ex.com/new").unwrap().is_some());
    }

    #[test]
    fn all_live_sorted_by_score() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        cache.put("https://ex.com/a", "A", 4, "ok").unwrap();
        cache.put("https://ex.com/b", "B", 9, "gold").unwrap();
        cache.put("https://ex.com/c", "C", 6, "decent").unwrap();

        let live = cache.all_live().unwrap();
        let scores: Vec<i64> = live.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![9, 6, 4]);
    }
}
