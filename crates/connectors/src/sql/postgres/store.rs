use crate::sql::{
    base::{
        error::{ConnectorError, DbError},
        store::Store,
    },
    postgres::{copy::PgCopyChannel, utils::connect_client},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{runtime::Handle, sync::Mutex};
use tokio_postgres::{Client, SimpleQueryMessage};
use tracing::{debug, error};

/// A single Postgres connection driven with auto-commit off.
///
/// `BEGIN` is issued lazily by the first statement after a commit or
/// rollback. When the last handle is dropped with a transaction still open,
/// a rollback is scheduled on the current runtime.
#[derive(Clone)]
pub struct PgStore {
    client: Arc<Mutex<Client>>,
    in_transaction: Arc<AtomicBool>,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            in_transaction: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    async fn begin_if_idle(&self, client: &Client) -> Result<(), DbError> {
        if !self.in_transaction() {
            client.batch_execute("BEGIN").await?;
            self.in_transaction.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn end_transaction(&self, statement: &str) -> Result<(), DbError> {
        let client = self.client.lock().await;
        if self.in_transaction.swap(false, Ordering::SeqCst) {
            client.batch_execute(statement).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    type Copy = PgCopyChannel;

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let client = self.client.lock().await;
        self.begin_if_idle(&client).await?;

        debug!(sql, "Executing statement");
        let messages = client.simple_query(sql).await?;
        let affected = messages
            .iter()
            .map(|message| match message {
                SimpleQueryMessage::CommandComplete(rows) => *rows,
                _ => 0,
            })
            .sum();
        Ok(affected)
    }

    async fn copy_in(&self, statement: &str) -> Result<PgCopyChannel, DbError> {
        let client = self.client.lock().await;
        self.begin_if_idle(&client).await?;

        debug!(statement, "Opening COPY channel");
        let sink = client.copy_in::<_, Bytes>(statement).await?;
        Ok(PgCopyChannel::new(sink))
    }

    async fn commit(&self) -> Result<(), DbError> {
        self.end_transaction("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.end_transaction("ROLLBACK").await
    }
}

impl Drop for PgStore {
    fn drop(&mut self) {
        if Arc::strong_count(&self.client) > 1 || !self.in_transaction() {
            return;
        }

        let Ok(handle) = Handle::try_current() else {
            return;
        };

        let client = Arc::clone(&self.client);
        let in_transaction = Arc::clone(&self.in_transaction);

        // `drop` cannot await, so the rollback runs on a spawned task.
        handle.spawn(async move {
            let client = client.lock().await;
            if in_transaction.swap(false, Ordering::SeqCst) {
                if let Err(err) = client.batch_execute("ROLLBACK").await {
                    error!(error = %err, "Failed to roll back abandoned transaction");
                }
            }
        });
    }
}
