use std::any::Any;
use std::sync::Arc;

use diesel::SqliteConnection;
use log::{debug, error};
use quotefeed_core::errors::{Error, Result};
use tokio::sync::{mpsc, oneshot};

use super::{DbConnection, DbPool};
use crate::errors::StorageError;

// A write job runs against the actor's connection and returns a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    // Each job is a boxed closure; the Box<dyn Any + Send> erases its return type.
    tx: mpsc::Sender<(ErasedJob, ErasedReply)>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection,
    /// inside an immediate transaction.
    ///
    /// The job either commits as a whole or not at all.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| StorageError::WriterUnavailable("writer actor stopped".to_string()))?;

        let boxed = ret_rx.await.map_err(|_| {
            StorageError::WriterUnavailable("writer actor dropped the reply".to_string())
        })??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Unexpected("writer actor returned an unexpected type".to_string()))
    }
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor holds one pooled connection and processes jobs serially. If the
/// connection cannot be acquired (or is lost), the pending job fails and the
/// next job tries again, so a database that comes back is picked up without a
/// restart.
pub fn spawn_writer(pool: Arc<DbPool>) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, ErasedReply)>(1024);

    tokio::spawn(async move {
        let mut conn: Option<DbConnection> = None;

        while let Some((job, reply_tx)) = rx.recv().await {
            if conn.is_none() {
                match pool.get() {
                    Ok(c) => conn = Some(c),
                    Err(e) => {
                        error!("Writer actor could not acquire a connection: {}", e);
                        let _ = reply_tx.send(Err(StorageError::PoolError(e).into()));
                        continue;
                    }
                }
            }
            let Some(c) = conn.as_mut() else {
                continue;
            };

            let result: Result<Box<dyn Any + Send + 'static>> = c
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            if result.is_err() {
                // Start from a fresh connection next time.
                conn = None;
            }

            // The requester may have given up (timeout or cancellation).
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped");
    });

    WriteHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations};
    use diesel::RunQueryDsl;

    #[tokio::test]
    async fn test_failed_job_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = init(dir.path().join("w.db").to_str().unwrap()).unwrap();
        let pool = create_pool(&path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer(pool.clone());

        writer
            .exec(|c| {
                diesel::sql_query("CREATE TABLE scratch (v INTEGER NOT NULL)")
                    .execute(c)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
            .unwrap();

        let result: Result<()> = writer
            .exec(|c| {
                diesel::sql_query("INSERT INTO scratch (v) VALUES (1)")
                    .execute(c)
                    .map_err(StorageError::from)?;
                Err(Error::Unexpected("abort".to_string()))
            })
            .await;
        assert!(result.is_err());

        let count: i64 = writer
            .exec(|c| {
                Ok(diesel::select(diesel::dsl::sql::<diesel::sql_types::BigInt>(
                    "(SELECT COUNT(*) FROM scratch)",
                ))
                .get_result(c)
                .map_err(StorageError::from)?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
