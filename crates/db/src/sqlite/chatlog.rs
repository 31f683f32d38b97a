//! SQLite-Implementierung des ChatLogRepository

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::ChatLogEintrag;
use crate::repository::{ChatLogRepository, DbResult};
use crate::sqlite::pool::SqliteDb;

impl ChatLogRepository for SqliteDb {
    async fn append(&self, sender: &str, content: &str) -> DbResult<ChatLogEintrag> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO chat_log (id, sender, content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(sender)
        .bind(content)
        .bind(now.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .execute(&self.pool)
        .await?;

        Ok(ChatLogEintrag {
            id,
            sender: sender.to_string(),
            content: content.to_string(),
            created_at: now,
        })
    }

    async fn count(&self) -> DbResult<i64> {
        use sqlx::Row as _;

        let row = sqlx::query("SELECT COUNT(*) AS anzahl FROM chat_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("anzahl")?)
    }

    async fn list_recent(&self, limit: i64) -> DbResult<Vec<ChatLogEintrag>> {
        let rows = sqlx::query(
            "SELECT id, sender, content, created_at
             FROM chat_log
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Chronologisch sortieren (aelteste zuerst)
        let mut eintraege: Vec<ChatLogEintrag> =
            rows.iter().map(row_to_eintrag).collect::<DbResult<_>>()?;
        eintraege.sort_by_key(|e| e.created_at);
        Ok(eintraege)
    }
}

fn row_to_eintrag(row: &sqlx::sqlite::SqliteRow) -> DbResult<ChatLogEintrag> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{id_str}': {e}")))?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?
        .with_timezone(&chrono::Utc);

    Ok(ChatLogEintrag {
        id,
        sender: row.try_get("sender")?,
        content: row.try_get("content")?,
        created_at,
    })
}
