//! Write transaction for SQLite that takes the database write lock up front.
//!
//! SeaORM opens SQLite transactions with a plain deferred `BEGIN`. A deferred
//! transaction that reads first and writes later cannot wait for the write
//! lock: SQLite fails the upgrade with `SQLITE_BUSY` regardless of
//! `busy_timeout`. `BEGIN IMMEDIATE` acquires the lock at start, where the busy
//! handler applies, so concurrent writers queue instead of failing.

use sea_orm::sea_query::Values;
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, ExecResult, QueryResult, RuntimeErr, Statement,
};
use sea_query_binder::SqlxValues;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;

const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

/// A pooled connection inside `BEGIN IMMEDIATE`, usable wherever SeaORM
/// expects a connection. Dropping it without `commit` rolls back.
pub struct ImmediateTransaction {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl ImmediateTransaction {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let tx = pool.begin_with(BEGIN_IMMEDIATE).await?;
        Ok(Self { tx: Mutex::new(tx) })
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().rollback().await
    }
}

fn values(stmt: Statement) -> (String, SqlxValues) {
    let values = stmt.values.unwrap_or_else(|| Values(Vec::new()));
    (stmt.sql, SqlxValues(values))
}

#[async_trait::async_trait]
impl ConnectionTrait for ImmediateTransaction {
    fn get_database_backend(&self) -> DbBackend {
        DbBackend::Sqlite
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        let (sql, args) = values(stmt);
        let mut tx = self.tx.lock().await;
        sqlx::query_with(&sql, args)
            .execute(&mut **tx)
            .await
            .map(Into::into)
            .map_err(|e| DbErr::Exec(RuntimeErr::SqlxError(e)))
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        let mut tx = self.tx.lock().await;
        sqlx::Executor::execute(&mut **tx, sqlx::raw_sql(sql))
            .await
            .map(Into::into)
            .map_err(|e| DbErr::Exec(RuntimeErr::SqlxError(e)))
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        let (sql, args) = values(stmt);
        let mut tx = self.tx.lock().await;
        sqlx::query_with(&sql, args)
            .fetch_optional(&mut **tx)
            .await
            .map(|row| row.map(Into::into))
            .map_err(|e| DbErr::Query(RuntimeErr::SqlxError(e)))
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        let (sql, args) = values(stmt);
        let mut tx = self.tx.lock().await;
        sqlx::query_with(&sql, args)
            .fetch_all(&mut **tx)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(|e| DbErr::Query(RuntimeErr::SqlxError(e)))
    }
}
