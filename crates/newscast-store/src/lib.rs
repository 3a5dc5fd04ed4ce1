//! SQLite-backed chat registry and news-post log.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use newscast_core::{
    broadcast::MediaKind,
    domain::{ChatId, Recipient, RecipientKind},
    errors::Error,
    ports::RecipientRegistry,
    Result,
};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ChatRow {
    chat_id: i64,
    chat_type: String,
    title: Option<String>,
}

impl From<ChatRow> for Recipient {
    fn from(r: ChatRow) -> Self {
        // Unknown stored kinds are treated as private chats.
        let kind = RecipientKind::parse(&r.chat_type).unwrap_or(RecipientKind::Direct);
        let display_name = r.title.unwrap_or_else(|| "Private Chat".to_string());
        Recipient::new(ChatId(r.chat_id), kind, display_name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatStats {
    pub total: usize,
    pub groups: usize,
    pub direct: usize,
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Registry(e.to_string())
}

/// Chat registry + news log on one SQLite database.
#[derive(Clone)]
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(db_err)?;
        Self::init(&pool).await?;
        tracing::info!(path = %path.display(), "chat store ready");
        Ok(Self::new(pool))
    }

    /// Create tables if missing.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS active_chats (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id       INTEGER NOT NULL UNIQUE,
                chat_type     TEXT    NOT NULL,
                title         TEXT,
                registered_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS news_posts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                content    TEXT    NOT NULL,
                media_type TEXT,
                media_id   TEXT,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Register a chat. Returns `false` if it was already registered.
    pub async fn add_chat(&self, chat_id: ChatId, kind: RecipientKind, title: Option<&str>) -> Result<bool> {
        let res = sqlx::query(
            r#"INSERT OR IGNORE INTO active_chats (chat_id, chat_type, title, registered_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(chat_id.0)
        .bind(kind.as_str())
        .bind(title)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let inserted = res.rows_affected() > 0;
        if inserted {
            tracing::info!(chat_id = chat_id.0, kind = kind.as_str(), "chat registered");
        }
        Ok(inserted)
    }

    /// All registered chats, oldest registration first.
    pub async fn list_chats(&self) -> Result<Vec<Recipient>> {
        let rows = sqlx::query_as::<_, ChatRow>(
            "SELECT chat_id, chat_type, title FROM active_chats ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    /// Chat counts; groups cover every kind `RecipientKind::parse` maps to a group.
    pub async fn stats(&self) -> Result<ChatStats> {
        let (total, groups): (i64, i64) = sqlx::query_as(
            r#"SELECT COUNT(*),
                      COALESCE(SUM(CASE WHEN chat_type IN ('group', 'supergroup', 'channel')
                                        THEN 1 ELSE 0 END), 0)
               FROM active_chats"#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let total = usize::try_from(total).unwrap_or_default();
        let groups = usize::try_from(groups).unwrap_or_default();
        Ok(ChatStats {
            total,
            groups,
            direct: total.saturating_sub(groups),
        })
    }

    /// Append an authored post to the log and return its id.
    pub async fn save_news(&self, content: &str, media: Option<(&MediaKind, &str)>) -> Result<i64> {
        let (media_type, media_id) = match media {
            Some((kind, id)) => (Some(kind.as_str()), Some(id)),
            None => (None, None),
        };
        let res = sqlx::query(
            r#"INSERT INTO news_posts (content, media_type, media_id, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(content)
        .bind(media_type)
        .bind(media_id)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.last_insert_rowid())
    }
}

#[async_trait]
impl RecipientRegistry for SqliteChatStore {
    async fn snapshot(&self) -> Result<Vec<Recipient>> {
        self.list_chats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteChatStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteChatStore::init(&pool).await.unwrap();
        SqliteChatStore::new(pool)
    }

    #[tokio::test]
    async fn add_chat_is_idempotent_and_keeps_registration_order() {
        let store = test_store().await;
        assert!(store
            .add_chat(ChatId(-300), RecipientKind::Group, Some("Traders"))
            .await
            .unwrap());
        assert!(store
            .add_chat(ChatId(42), RecipientKind::Direct, None)
            .await
            .unwrap());
        assert!(!store
            .add_chat(ChatId(-300), RecipientKind::Group, Some("Renamed"))
            .await
            .unwrap());
        assert!(store
            .add_chat(ChatId(-100), RecipientKind::Group, Some("Locals"))
            .await
            .unwrap());

        let snap = store.snapshot().await.unwrap();
        let ids: Vec<i64> = snap.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![-300, 42, -100]);
        assert_eq!(snap[0].display_name, "Traders");
        assert_eq!(snap[1].display_name, "Private Chat");
        assert_eq!(snap[1].kind, RecipientKind::Direct);
    }

    #[tokio::test]
    async fn stats_split_groups_and_private_chats() {
        let store = test_store().await;
        store
            .add_chat(ChatId(-1), RecipientKind::Group, Some("a"))
            .await
            .unwrap();
        store
            .add_chat(ChatId(-2), RecipientKind::Group, Some("b"))
            .await
            .unwrap();
        store
            .add_chat(ChatId(3), RecipientKind::Direct, None)
            .await
            .unwrap();
        assert_eq!(
            store.stats().await.unwrap(),
            ChatStats {
                total: 3,
                groups: 2,
                direct: 1
            }
        );
    }

    #[tokio::test]
    async fn stats_agree_with_snapshot_for_legacy_chat_types() {
        let store = test_store().await;
        for (id, kind) in [(-10_i64, "supergroup"), (-11, "channel"), (12, "private"), (13, "bogus")] {
            sqlx::query(
                "INSERT INTO active_chats (chat_id, chat_type, title, registered_at) VALUES (?, ?, NULL, 0)",
            )
            .bind(id)
            .bind(kind)
            .execute(&store.pool)
            .await
            .unwrap();
        }

        let snap = store.snapshot().await.unwrap();
        let groups = snap.iter().filter(|r| r.kind == RecipientKind::Group).count();
        assert_eq!(
            store.stats().await.unwrap(),
            ChatStats {
                total: snap.len(),
                groups,
                direct: snap.len() - groups
            }
        );
        assert_eq!(groups, 2);
    }

    #[tokio::test]
    async fn save_news_returns_increasing_ids() {
        let store = test_store().await;
        let first = store.save_news("hello", None).await.unwrap();
        let second = store
            .save_news("pic", Some((&MediaKind::Photo, "file-1")))
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn empty_registry_snapshot_is_ok() {
        let store = test_store().await;
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
