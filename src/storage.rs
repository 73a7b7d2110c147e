use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};
use tokio::sync::Mutex;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
        }
    }

    /// Capitalised label used when rendering history into a prompt
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Ai => "Ai",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "ai" => Some(Role::Ai),
            _ => None,
        }
    }
}

/// One stored chat turn. Ordering is by `sequence` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
    pub sequence: u64,
}

impl HistoryTurn {
    #[must_use]
    pub fn context_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// Internal history record for SurrealDB
#[derive(Debug, Clone, Serialize)]
struct TurnRecord {
    sequence: u64,
    role: String,
    content: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct TurnRow {
    sequence: u64,
    role: String,
    content: String,
}

impl TurnRow {
    fn into_turn(self) -> Option<HistoryTurn> {
        let Some(role) = Role::parse(&self.role) else {
            tracing::warn!(sequence = self.sequence, role = %self.role, "skipping turn with unknown role");
            return None;
        };
        Some(HistoryTurn {
            role,
            content: self.content,
            sequence: self.sequence,
        })
    }
}

/// Append-only conversation log backed by SurrealDB
#[derive(Clone)]
pub struct HistoryStore {
    db: Surreal<Db>,
    // Serializes sequence assignment and clears
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    /// Opens (or creates) the on-disk store inside `data_dir`
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("vizwiz.db");

        let db = Surreal::new::<RocksDb>(db_path).await?;
        Self::with_db(db).await
    }

    /// Opens a throwaway in-memory store
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let db = Surreal::new::<surrealdb::engine::local::Mem>(()).await?;
        Self::with_db(db).await
    }

    async fn with_db(db: Surreal<Db>) -> Result<Self> {
        db.use_ns("vizwiz").use_db("main").await?;

        let store = Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.init_db().await?;
        Ok(store)
    }

    async fn init_db(&self) -> Result<()> {
        self.db.query("
            DEFINE TABLE IF NOT EXISTS history SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS sequence ON history TYPE int;
            DEFINE FIELD IF NOT EXISTS role ON history TYPE string;
            DEFINE FIELD IF NOT EXISTS content ON history TYPE string;
            DEFINE FIELD IF NOT EXISTS created_at ON history TYPE string;
            DEFINE TABLE IF NOT EXISTS history_meta SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS high_water ON history_meta TYPE int;
        ").await?.check()?;

        Ok(())
    }

    /// Appends a single turn and returns it with its assigned sequence id.
    /// Request handling records whole exchanges via [`Self::append_exchange`].
    #[cfg(test)]
    pub async fn append(&self, role: Role, content: &str) -> Result<HistoryTurn> {
        let _guard = self.write_lock.lock().await;
        let sequence = self.last_sequence().await? + 1;

        let created: Option<TurnRow> = self.db
            .create("history")
            .content(TurnRecord {
                sequence,
                role: role.as_str().to_string(),
                content: content.to_string(),
                created_at: chrono::Local::now().to_rfc3339(),
            })
            .await?;

        created
            .and_then(TurnRow::into_turn)
            .ok_or_else(|| color_eyre::eyre::eyre!("Failed to create history turn"))
    }

    /// Records a question and its answer together; either both turns are
    /// stored or neither is
    pub async fn append_exchange(&self, question: &str, answer: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let sequence = self.last_sequence().await?;
        let now = chrono::Local::now().to_rfc3339();

        self.db.query("
            BEGIN TRANSACTION;
            CREATE history CONTENT $question;
            CREATE history CONTENT $answer;
            COMMIT TRANSACTION;
        ")
        .bind(("question", TurnRecord {
            sequence: sequence + 1,
            role: Role::User.as_str().to_string(),
            content: question.to_string(),
            created_at: now.clone(),
        }))
        .bind(("answer", TurnRecord {
            sequence: sequence + 2,
            role: Role::Ai.as_str().to_string(),
            content: answer.to_string(),
            created_at: now,
        }))
        .await?
        .check()?;

        Ok(())
    }

    /// Highest sequence ever assigned, including turns removed by `clear`
    async fn last_sequence(&self) -> Result<u64> {
        #[derive(Debug, Deserialize)]
        struct SequenceRow {
            sequence: u64,
        }

        #[derive(Debug, Deserialize)]
        struct HighWaterRow {
            high_water: u64,
        }

        let mut response = self.db.query("
            SELECT sequence FROM history ORDER BY sequence DESC LIMIT 1;
            SELECT high_water FROM history_meta:sequence;
        ").await?;
        let rows: Vec<SequenceRow> = response.take(0)?;
        let marks: Vec<HighWaterRow> = response.take(1)?;

        let stored = rows.first().map_or(0, |row| row.sequence);
        let cleared = marks.first().map_or(0, |mark| mark.high_water);
        Ok(stored.max(cleared))
    }

    /// Loads up to `limit` most recent turns, oldest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryTurn>> {
        let mut response = self.db.query("
            SELECT sequence, role, content
            FROM history
            ORDER BY sequence DESC
            LIMIT $limit
        ")
        .bind(("limit", limit))
        .await?;

        let rows: Vec<TurnRow> = response.take(0)?;
        let mut turns: Vec<HistoryTurn> = rows.into_iter().filter_map(TurnRow::into_turn).collect();
        turns.reverse();
        Ok(turns)
    }

    /// Loads every turn, oldest first
    pub async fn all(&self) -> Result<Vec<HistoryTurn>> {
        let mut response = self.db.query("
            SELECT sequence, role, content
            FROM history
            ORDER BY sequence ASC
        ").await?;

        let rows: Vec<TurnRow> = response.take(0)?;
        Ok(rows.into_iter().filter_map(TurnRow::into_turn).collect())
    }

    /// Renders the last `limit` turns as `Role: content` lines
    pub async fn history_text(&self, limit: usize) -> Result<String> {
        let turns = self.recent(limit).await?;
        Ok(render_context_lines(&turns))
    }

    /// Deletes every turn. Sequence ids keep counting from where they were.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let high_water = self.last_sequence().await?;

        self.db.query("
            BEGIN TRANSACTION;
            DELETE FROM history;
            UPSERT history_meta:sequence SET high_water = $high_water;
            COMMIT TRANSACTION;
        ")
        .bind(("high_water", high_water))
        .await?
        .check()?;

        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        #[derive(Debug, Deserialize)]
        struct CountResult {
            count: usize,
        }

        let mut response = self.db.query("
            SELECT count() AS count FROM history GROUP ALL
        ").await?;
        let results: Vec<CountResult> = response.take(0)?;
        Ok(results.first().map_or(0, |entry| entry.count))
    }
}

#[must_use]
pub fn render_context_lines(turns: &[HistoryTurn]) -> String {
    turns
        .iter()
        .map(HistoryTurn::context_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full transcript as `role: content` lines, used for the session briefing
#[must_use]
pub fn render_transcript(turns: &[HistoryTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
