//! Transcript persistence.
//!
//! Turns call `ConversationLog::record` synchronously; [`ChannelLog`] only
//! enqueues, and a background task spawned by [`spawn_writer`] drains the
//! queue into PostgreSQL. A full queue drops the entry with a warning.

use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use sb_dialog::ConversationLog;
use sb_protocol::transcript::LogEntry;

/// Log sink that hands entries to the writer task.
#[derive(Clone)]
pub struct ChannelLog {
    tx: mpsc::Sender<LogEntry>,
}

impl ChannelLog {
    /// Create the sink and the receiving half for [`spawn_writer`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ConversationLog for ChannelLog {
    fn record(&self, entry: LogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(session = %entry.session_id, "transcript queue full, dropping entry");
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(session = %entry.session_id, "transcript writer stopped, dropping entry");
            }
        }
    }
}

/// Spawn the task that drains `rx` into the database.
///
/// Runs until every `ChannelLog` handle is dropped.
pub fn spawn_writer(pool: PgPool, mut rx: mpsc::Receiver<LogEntry>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("transcript writer started");
        while let Some(entry) = rx.recv().await {
            if let Err(e) = write_entry(&pool, &entry).await {
                tracing::warn!(
                    session = %entry.session_id,
                    error = %e,
                    "failed to persist transcript entry"
                );
            }
        }
        tracing::info!("transcript writer stopped");
    })
}

/// Upsert the conversation row and append the message.
pub async fn write_entry(pool: &PgPool, entry: &LogEntry) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO conversations (session_id, user_id, channel, started_at, last_message_at, message_count)
         VALUES ($1, $2, $3, $4, $4, 1)
         ON CONFLICT (session_id) DO UPDATE
         SET last_message_at = GREATEST(conversations.last_message_at, EXCLUDED.last_message_at),
             message_count = conversations.message_count + 1",
    )
    .bind(entry.session_id.as_str())
    .bind(&entry.user_id)
    .bind(&entry.channel)
    .bind(entry.logged_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO messages (session_id, sender, text, intent, confidence, sentiment, sentiment_score, logged_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.session_id.as_str())
    .bind(entry.sender.as_str())
    .bind(&entry.text)
    .bind(entry.intent.map(|i| i.as_str()))
    .bind(entry.confidence)
    .bind(entry.sentiment.map(|s| s.label.as_str()))
    .bind(entry.sentiment.map(|s| s.compound))
    .bind(entry.logged_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Log sink for in-memory mode: transcript lines go to tracing only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ConversationLog for TracingLog {
    fn record(&self, entry: LogEntry) {
        tracing::debug!(
            session = %entry.session_id,
            sender = entry.sender.as_str(),
            intent = entry.intent.map(|i| i.as_str()),
            text = %entry.text,
            "transcript"
        );
    }
}
