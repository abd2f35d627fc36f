//! SQLite Persistent Storage
//!
//! Durable storage for the commitment/nullifier sets and pool balances,
//! surviving service restarts. Uses connection pooling via r2d2. Each
//! mutating operation runs inside one transaction so the membership check
//! and the insert (and the accumulator root update) commit as a single
//! atomic step.

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

use super::traits::{BalanceStore, PoolBalance, ShieldedStore, StorageError, StorageResult};
use crate::shielded::{chain_root, EMPTY_ROOT, MAX_LEAVES, ROOT_HISTORY_SIZE};
use crate::tokens::SupportedToken;

type SqlitePool = Pool<SqliteConnectionManager>;
type SqliteConn = PooledConnection<SqliteConnectionManager>;

fn build_pool(manager: SqliteConnectionManager, max_size: u32) -> StorageResult<SqlitePool> {
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn decode_root(hex_str: &str) -> StorageResult<[u8; 32]> {
    let bytes = hex::decode(hex_str).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| StorageError::InvalidData("root must be 32 bytes".to_string()))
}

// ============================================================================
// Shielded store
// ============================================================================

/// SQLite-backed shielded store with connection pooling
pub struct SqliteShieldedStore {
    pool: SqlitePool,
}

impl SqliteShieldedStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database file and runs migrations if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let pool = build_pool(SqliteConnectionManager::file(db_path), 10)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let pool = build_pool(SqliteConnectionManager::memory(), 1)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> StorageResult<SqliteConn> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn run_migrations(&self) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shielded_commitments (
                commitment TEXT PRIMARY KEY,
                leaf_index INTEGER NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shielded_nullifiers (
                nullifier TEXT PRIMARY KEY,
                spent_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS accumulator (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_root TEXT NOT NULL,
                leaf_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS root_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                root TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_root_history_root ON root_history(root);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        conn.execute(
            "INSERT OR IGNORE INTO accumulator (id, current_root, leaf_count) VALUES (1, ?1, 0)",
            params![hex::encode(EMPTY_ROOT)],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    // Synchronous helpers for the trait implementation

    fn insert_commitment_sync(&self, commitment: &[u8; 32]) -> StorageResult<u64> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let commitment_hex = hex::encode(commitment);

        let exists: Option<i64> = tx
            .query_row(
                "SELECT leaf_index FROM shielded_commitments WHERE commitment = ?1",
                params![commitment_hex],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if exists.is_some() {
            return Err(StorageError::Duplicate(format!(
                "commitment {}",
                &commitment_hex[..16]
            )));
        }

        let (current_root_hex, leaf_count): (String, i64) = tx
            .query_row(
                "SELECT current_root, leaf_count FROM accumulator WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if leaf_count as u64 >= MAX_LEAVES {
            return Err(StorageError::InvalidData("commitment log full".to_string()));
        }

        let current_root = decode_root(&current_root_hex)?;
        let new_root = chain_root(&current_root, commitment);

        tx.execute(
            "INSERT INTO shielded_commitments (commitment, leaf_index, created_at)
             VALUES (?1, ?2, ?3)",
            params![commitment_hex, leaf_count, chrono::Utc::now().timestamp()],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO root_history (root) VALUES (?1)",
            params![current_root_hex],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        // prune the ring to the configured history size
        tx.execute(
            "DELETE FROM root_history
             WHERE seq <= (SELECT MAX(seq) FROM root_history) - ?1",
            params![ROOT_HISTORY_SIZE as i64],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.execute(
            "UPDATE accumulator SET current_root = ?1, leaf_count = ?2 WHERE id = 1",
            params![hex::encode(new_root), leaf_count + 1],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(leaf_count as u64)
    }

    fn spend_nullifier_sync(&self, nullifier: &[u8; 32]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let nullifier_hex = hex::encode(nullifier);

        let spent: Option<i64> = tx
            .query_row(
                "SELECT spent_at FROM shielded_nullifiers WHERE nullifier = ?1",
                params![nullifier_hex],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if spent.is_some() {
            return Err(StorageError::Duplicate(format!(
                "nullifier {}",
                &nullifier_hex[..16]
            )));
        }

        tx.execute(
            "INSERT INTO shielded_nullifiers (nullifier, spent_at) VALUES (?1, ?2)",
            params![nullifier_hex, chrono::Utc::now().timestamp()],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn count_sync(&self, sql: &str) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl ShieldedStore for SqliteShieldedStore {
    async fn insert_commitment(&self, commitment: &[u8; 32]) -> StorageResult<u64> {
        self.insert_commitment_sync(commitment)
    }

    async fn has_commitment(&self, commitment: &[u8; 32]) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT leaf_index FROM shielded_commitments WHERE commitment = ?1",
                params![hex::encode(commitment)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(exists.is_some())
    }

    async fn spend_nullifier(&self, nullifier: &[u8; 32]) -> StorageResult<()> {
        self.spend_nullifier_sync(nullifier)
    }

    async fn is_nullifier_spent(&self, nullifier: &[u8; 32]) -> StorageResult<bool> {
        let conn = self.conn()?;
        let spent: Option<i64> = conn
            .query_row(
                "SELECT spent_at FROM shielded_nullifiers WHERE nullifier = ?1",
                params![hex::encode(nullifier)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(spent.is_some())
    }

    async fn current_root(&self) -> StorageResult<[u8; 32]> {
        let conn = self.conn()?;
        let root_hex: String = conn
            .query_row(
                "SELECT current_root FROM accumulator WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;
        decode_root(&root_hex)
    }

    async fn is_known_root(&self, root: &[u8; 32]) -> StorageResult<bool> {
        if self.current_root().await? == *root {
            return Ok(true);
        }

        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT seq FROM root_history WHERE root = ?1 LIMIT 1",
                params![hex::encode(root)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn commitment_count(&self) -> StorageResult<u64> {
        self.count_sync("SELECT COUNT(*) FROM shielded_commitments")
    }

    async fn spent_nullifier_count(&self) -> StorageResult<u64> {
        self.count_sync("SELECT COUNT(*) FROM shielded_nullifiers")
    }
}

// ============================================================================
// Balance store
// ============================================================================

/// SQLite-backed balance store
pub struct SqliteBalanceStore {
    pool: SqlitePool,
}

impl SqliteBalanceStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let pool = build_pool(SqliteConnectionManager::file(db_path), 10)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> StorageResult<Self> {
        let pool = build_pool(SqliteConnectionManager::memory(), 1)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> StorageResult<SqliteConn> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn run_migrations(&self) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pool_balances (
                wallet TEXT NOT NULL,
                token TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 0,
                deposited INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (wallet, token)
            );
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn read_balance(
        conn: &rusqlite::Connection,
        wallet: &str,
        token: SupportedToken,
    ) -> StorageResult<Option<PoolBalance>> {
        conn.query_row(
            "SELECT available, deposited FROM pool_balances WHERE wallet = ?1 AND token = ?2",
            params![wallet, token.symbol()],
            |row| {
                Ok(PoolBalance {
                    available: row.get::<_, i64>(0)? as u64,
                    deposited: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn debit_in_tx(
        tx: &rusqlite::Transaction,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance> {
        let current = Self::read_balance(tx, wallet, token)?
            .ok_or_else(|| StorageError::Insufficient(format!("no balance for {}", wallet)))?;

        if current.available < amount {
            return Err(StorageError::Insufficient(format!(
                "available {} < requested {}",
                current.available, amount
            )));
        }

        let new_available = current.available - amount;
        tx.execute(
            "UPDATE pool_balances SET available = ?1 WHERE wallet = ?2 AND token = ?3",
            params![new_available as i64, wallet, token.symbol()],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(PoolBalance {
            available: new_available,
            deposited: current.deposited,
        })
    }

    fn credit_in_tx(
        tx: &rusqlite::Transaction,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
        count_as_deposit: bool,
    ) -> StorageResult<PoolBalance> {
        let deposited_delta = if count_as_deposit { amount as i64 } else { 0 };

        tx.execute(
            "INSERT INTO pool_balances (wallet, token, available, deposited)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(wallet, token) DO UPDATE SET
                 available = available + excluded.available,
                 deposited = deposited + ?4",
            params![wallet, token.symbol(), amount as i64, deposited_delta],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Self::read_balance(tx, wallet, token)?
            .ok_or_else(|| StorageError::Database("balance row missing after upsert".to_string()))
    }
}

#[async_trait]
impl BalanceStore for SqliteBalanceStore {
    async fn credit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let balance = Self::credit_in_tx(&tx, wallet, token, amount, true)?;
        tx.commit().map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(balance)
    }

    async fn debit(
        &self,
        wallet: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<PoolBalance> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let balance = Self::debit_in_tx(&tx, wallet, token, amount)?;
        tx.commit().map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(balance)
    }

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        token: SupportedToken,
        amount: u64,
    ) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Self::debit_in_tx(&tx, from, token, amount)?;
        Self::credit_in_tx(&tx, to, token, amount, false)?;

        tx.commit().map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    async fn balance(&self, wallet: &str, token: SupportedToken) -> StorageResult<PoolBalance> {
        let conn = self.conn()?;
        Ok(Self::read_balance(&conn, wallet, token)?.unwrap_or_default())
    }

    async fn total_locked(&self, token: SupportedToken) -> StorageResult<u64> {
        let conn = self.conn()?;
        let total: Option<i64> = conn
            .query_row(
                "SELECT SUM(available) FROM pool_balances WHERE token = ?1",
                params![token.symbol()],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(total.unwrap_or(0) as u64)
    }
}
