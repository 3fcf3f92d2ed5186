use crate::resolve::ResolvedStream;
use anyhow::Context;
use rusqlite::{Connection, params};
use std::path::Path;

/// Query -> stream cache. Stream URLs from YouTube expire after a few hours,
/// so entries carry their own deadline.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS resolution_cache (
  query TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  audio_url TEXT,
  expires_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resolution_expires_at ON resolution_cache(expires_at);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn get_resolution(
        &self,
        query: &str,
        now_unix: i64,
    ) -> anyhow::Result<Option<ResolvedStream>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, audio_url, expires_at FROM resolution_cache WHERE query=?1")
            .context("prepare resolution cache")?;
        let mut rows = stmt.query(params![query]).context("query resolution cache")?;
        if let Some(row) = rows.next().context("read resolution cache row")? {
            let title: String = row.get(0)?;
            let audio_url: Option<String> = row.get(1)?;
            let exp: i64 = row.get(2)?;
            if exp > now_unix {
                Ok(Some(ResolvedStream { title, audio_url }))
            } else {
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    pub fn put_resolution(
        &self,
        query: &str,
        stream: &ResolvedStream,
        ttl_secs: i64,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO resolution_cache(query, title, audio_url, expires_at, updated_at)
VALUES(?1, ?2, ?3, ?4, ?5)
ON CONFLICT(query) DO UPDATE SET
  title=excluded.title,
  audio_url=excluded.audio_url,
  expires_at=excluded.expires_at,
  updated_at=excluded.updated_at
"#,
                params![
                    query,
                    stream.title,
                    stream.audio_url,
                    now_unix.saturating_add(ttl_secs),
                    now_unix
                ],
            )
            .context("cache resolution")?;
        Ok(())
    }

    /// Drops expired rows, returning how many were removed.
    pub fn purge_expired(&self, now_unix: i64) -> anyhow::Result<usize> {
        let n = self
            .conn
            .execute(
                "DELETE FROM resolution_cache WHERE expires_at <= ?1",
                params![now_unix],
            )
            .context("purge resolution cache")?;
        Ok(n)
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
