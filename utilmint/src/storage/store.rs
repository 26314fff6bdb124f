// Copyright (c) 2024 Botho Foundation

use lmdb::{
    Cursor, Database, Environment, EnvironmentFlags, RwTransaction, Transaction, WriteFlags,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::StoreError;
use crate::claims::{AllocationClaim, DistributionLedger};
use crate::currency::LocalCurrency;
use crate::engine::EngineState;
use crate::history::UsageLedger;
use crate::period::CollectionPeriodState;
use crate::sources::SourceRegistry;
use crate::types::{AccountName, UsageSnapshot};

/// LMDB-backed engine storage
pub struct EngineStore {
    env: Environment,
    /// snapshots: sequence (8 bytes, big-endian) -> UsageSnapshot
    snapshots_db: Database,
    /// claims: participant -> AllocationClaim
    claims_db: Database,
    /// sources: account -> ()
    sources_db: Database,
    /// metadata: key -> value (period state, currency, snapshot count)
    meta_db: Database,
}

// Metadata keys
const META_PERIOD: &[u8; 6] = b"period";
const META_CURRENCY: &[u8; 8] = b"currency";
const META_SNAPSHOT_COUNT: &[u8; 14] = b"snapshot_count";

impl EngineStore {
    /// Open or create a store at the given directory.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(path).map_err(|e| StoreError::Database(e.to_string()))?;

        let env = Environment::new()
            .set_flags(EnvironmentFlags::NO_SUB_DIR)
            .set_max_dbs(4)
            .set_map_size(1024 * 1024 * 1024) // 1GB
            .open(path.join("engine.mdb").as_ref())?;

        let snapshots_db = env.create_db(Some("snapshots"), lmdb::DatabaseFlags::empty())?;
        let claims_db = env.create_db(Some("claims"), lmdb::DatabaseFlags::empty())?;
        let sources_db = env.create_db(Some("sources"), lmdb::DatabaseFlags::empty())?;
        let meta_db = env.create_db(Some("meta"), lmdb::DatabaseFlags::empty())?;

        debug!(path = %path.display(), "Opened engine store");

        Ok(Self {
            env,
            snapshots_db,
            claims_db,
            sources_db,
            meta_db,
        })
    }

    /// Number of snapshots persisted.
    pub fn snapshot_count(&self) -> Result<u64, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        read_count(&txn, self.meta_db)
    }

    /// Get a persisted snapshot by sequence number.
    pub fn get_snapshot(&self, sequence: u64) -> Result<Option<UsageSnapshot>, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        match txn.get(self.snapshots_db, &sequence.to_be_bytes()) {
            Ok(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the full engine state. An empty store yields the default state.
    pub fn load_state(&self) -> Result<EngineState, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        self.read_state(&txn)
    }

    /// Load the local currency ledger, if one has been stored.
    pub fn load_currency(&self) -> Result<Option<LocalCurrency>, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        read_meta(&txn, self.meta_db, META_CURRENCY)
    }

    /// Persist `state` and `currency` in one write transaction.
    ///
    /// Snapshots are append-only: rows already stored are never rewritten,
    /// and a state with fewer snapshots than the store is rejected.
    pub fn commit(&self, state: &EngineState, currency: &LocalCurrency) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;
        let (stored, len) = self.write_state(&mut txn, state, currency)?;
        txn.commit()?;
        log_commit(stored, len);
        Ok(())
    }

    /// Run `f` against the stored state and commit only if it succeeds.
    ///
    /// The state is read, changed and written back inside a single write
    /// transaction, so concurrent writers are serialized by LMDB.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut EngineState, &mut LocalCurrency) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut txn = self.env.begin_rw_txn().map_err(StoreError::from)?;
        let mut state = self.read_state(&txn)?;
        let mut currency: LocalCurrency =
            read_meta(&txn, self.meta_db, META_CURRENCY)?.unwrap_or_default();

        // Dropping the transaction on error aborts it
        let value = f(&mut state, &mut currency)?;

        let (stored, len) = self.write_state(&mut txn, &state, &currency)?;
        txn.commit().map_err(StoreError::from)?;
        log_commit(stored, len);
        Ok(value)
    }

    fn read_state<T: Transaction>(&self, txn: &T) -> Result<EngineState, StoreError> {
        let count = read_count(txn, self.meta_db)?;
        let mut snapshots = Vec::with_capacity(count as usize);
        for sequence in 0..count {
            let bytes = match txn.get(self.snapshots_db, &sequence.to_be_bytes()) {
                Ok(bytes) => bytes,
                Err(lmdb::Error::NotFound) => {
                    return Err(StoreError::Corrupt(format!(
                        "snapshot {sequence} missing of {count}"
                    )))
                }
                Err(e) => return Err(e.into()),
            };
            snapshots.push(bincode::deserialize::<UsageSnapshot>(bytes)?);
        }
        let history =
            UsageLedger::restore(snapshots).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut sources = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(self.sources_db)?;
            for item in cursor.iter_start() {
                let (key, _) = item?;
                let name = std::str::from_utf8(key)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
                    .and_then(|s| {
                        AccountName::new(s).map_err(|e| StoreError::Corrupt(e.to_string()))
                    })?;
                sources.push(name);
            }
        }

        let mut claims = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(self.claims_db)?;
            for item in cursor.iter_start() {
                let (_, value) = item?;
                claims.push(bincode::deserialize::<AllocationClaim>(value)?);
            }
        }

        let period: CollectionPeriodState =
            read_meta(txn, self.meta_db, META_PERIOD)?.unwrap_or_default();

        Ok(EngineState {
            sources: sources.into_iter().collect::<SourceRegistry>(),
            history,
            claims: claims.into_iter().collect::<DistributionLedger>(),
            period,
        })
    }

    /// Write everything into `txn`. Returns the stored and new snapshot counts.
    fn write_state(
        &self,
        txn: &mut RwTransaction<'_>,
        state: &EngineState,
        currency: &LocalCurrency,
    ) -> Result<(u64, u64), StoreError> {
        let stored = read_count(&*txn, self.meta_db)?;
        let len = state.history.len() as u64;
        if len < stored {
            return Err(StoreError::Corrupt(format!(
                "history shrank from {stored} to {len} snapshots"
            )));
        }

        for snapshot in state.history.iter().skip(stored as usize) {
            let bytes = bincode::serialize(snapshot)?;
            txn.put(
                self.snapshots_db,
                &snapshot.sequence.to_be_bytes(),
                &bytes,
                WriteFlags::empty(),
            )?;
        }
        txn.put(
            self.meta_db,
            META_SNAPSHOT_COUNT,
            &len.to_be_bytes(),
            WriteFlags::empty(),
        )?;

        txn.clear_db(self.claims_db)?;
        for claim in state.claims.iter() {
            let bytes = bincode::serialize(claim)?;
            txn.put(
                self.claims_db,
                &claim.participant.as_bytes(),
                &bytes,
                WriteFlags::empty(),
            )?;
        }

        txn.clear_db(self.sources_db)?;
        for source in state.sources.iter() {
            txn.put(self.sources_db, &source.as_bytes(), b"", WriteFlags::empty())?;
        }

        let period = bincode::serialize(&state.period)?;
        txn.put(self.meta_db, META_PERIOD, &period, WriteFlags::empty())?;

        let currency = bincode::serialize(currency)?;
        txn.put(self.meta_db, META_CURRENCY, &currency, WriteFlags::empty())?;

        Ok((stored, len))
    }
}

fn log_commit(stored: u64, len: u64) {
    if len > stored {
        info!(snapshots = len, appended = len - stored, "Engine state committed");
    } else {
        debug!(snapshots = len, "Engine state committed");
    }
}

fn read_count<T: Transaction>(txn: &T, meta_db: Database) -> Result<u64, StoreError> {
    match txn.get(meta_db, META_SNAPSHOT_COUNT) {
        Ok(bytes) => {
            let raw: [u8; 8] = bytes
                .try_into()
                .map_err(|_| StoreError::Corrupt("bad snapshot count".to_string()))?;
            Ok(u64::from_be_bytes(raw))
        }
        Err(lmdb::Error::NotFound) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn read_meta<T: Transaction, V: DeserializeOwned>(
    txn: &T,
    meta_db: Database,
    key: &[u8],
) -> Result<Option<V>, StoreError> {
    match txn.get(meta_db, &key) {
        Ok(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
