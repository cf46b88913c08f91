//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::LmdbError;

/// Number of named databases in the environment.
const MAX_DBS: u32 = 4;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    /// `giveaway_id -> Giveaway`
    pub(crate) giveaways_db: Database<Bytes, Bytes>,
    /// `giveaway_id ++ 0 ++ user_id -> Participant`
    pub(crate) participants_db: Database<Bytes, Bytes>,
    /// `creator_id ++ 0 ++ giveaway_id -> ()`
    pub(crate) creator_index_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(MAX_DBS);
        // SAFETY: the directory is owned by this process and opened once;
        // nothing else maps the same files.
        let env = unsafe { options.open(path)? };

        let mut wtxn = env.write_txn()?;
        let giveaways_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("giveaways"))?;
        let participants_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("participants"))?;
        let creator_index_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("creator_index"))?;
        wtxn.commit()?;

        info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            giveaways_db,
            participants_db,
            creator_index_db,
        })
    }
}
