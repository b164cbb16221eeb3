use sqlx::PgConnection;

/// Owns clients for external systems the application talks to. Domain logic receives an
/// implementation of this trait so driven adapters can borrow connections without caring
/// whether they're pooled or part of an active transaction.
#[allow(async_fn_in_trait)]
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a handle which can lend out a database connection
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// A held database connection lease acquired through [ExternalConnectivity]
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Implemented by connectivity owners which can open a database transaction
#[allow(async_fn_in_trait)]
pub trait Transactable: Sync {
    type Handle: ExternalConnectivity + TransactionHandle;

    /// Begins a transaction, producing a connectivity handle whose database operations
    /// are isolated until [TransactionHandle::commit] is invoked
    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// A connectivity handle with an open transaction which can be committed. Dropping the
/// handle without committing rolls the transaction back.
#[allow(async_fn_in_trait)]
pub trait TransactionHandle {
    /// Commits the changes made during this transaction
    async fn commit(self) -> Result<(), anyhow::Error>;
}
