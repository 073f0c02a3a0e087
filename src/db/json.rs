use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::models::GiveawayDocument;
use crate::error::{Error, Result};
use crate::giveaway::models::Giveaway;
use crate::storage::GiveawayStore;

pub const WRITE_ATTEMPTS: u32 = 3;
pub const WRITE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// A store persisted as a single JSON document that gets rewritten on every
/// committed change.
///
/// The in-memory copy only ever holds what is already on disk: a change is
/// written out first and published afterwards, both under the writer lock.
/// Writers of the same id are additionally serialized by a per-id lock, so
/// the read-modify-write of one record never interleaves with another one.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    giveaways: DashMap<String, Giveaway>,
    record_locks: DashMap<String, Arc<Mutex<()>>>,
    writer: Mutex<()>,
}

impl JsonStore {
    // Loads the document at `path`, creating an empty one when the file is
    // missing. A file that can't be read or parsed is an error, never an
    // empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<GiveawayDocument>(&content).map_err(|err| {
                error!("Can't parse the giveaway document {}: {}", path.display(), err);
                Error::from(err)
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("Creating an empty giveaway document at {}", path.display());
                let document = GiveawayDocument::new();
                write_document(&path, &document)?;
                document
            }
            Err(err) => {
                error!("Can't read the giveaway document {}: {}", path.display(), err);
                return Err(Error::from(err));
            }
        };

        info!(
            "Loaded {} giveaway(s) from {}",
            document.giveaways.len(),
            path.display()
        );
        Ok(JsonStore {
            path,
            giveaways: document.giveaways.into_iter().collect(),
            record_locks: DashMap::new(),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // The locks guard no data, so a panic while holding one leaves nothing
    // inconsistent and the poison flag is ignored.
    fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.record_locks
            .entry(id.to_string())
            .or_default()
            .value()
            .clone()
    }

    // Writes the document with `giveaway` stored under `id`, then publishes
    // the record in memory.
    fn commit(&self, id: &str, giveaway: Giveaway) -> Result<()> {
        let _writer = JsonStore::acquire(&self.writer);

        let mut document = GiveawayDocument::new();
        for pair in self.giveaways.iter() {
            document
                .giveaways
                .insert(pair.key().clone(), pair.value().clone());
        }
        document.giveaways.insert(id.to_string(), giveaway.clone());

        write_document(&self.path, &document)?;
        self.giveaways.insert(id.to_string(), giveaway);
        debug!("Giveaway `{}` saved to {}", id, self.path.display());
        Ok(())
    }
}

impl GiveawayStore for JsonStore {
    fn get(&self, id: &str) -> Result<Giveaway> {
        self.giveaways
            .get(id)
            .map(|giveaway| giveaway.value().clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn create(&self, id: &str, giveaway: Giveaway) -> Result<()> {
        let lock = self.record_lock(id);
        let _guard = JsonStore::acquire(&lock);

        if self.giveaways.contains_key(id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        self.commit(id, giveaway)
    }

    fn update<T, F>(&self, id: &str, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Giveaway) -> Result<T>,
    {
        // Unknown ids never get a lock entry.
        if !self.giveaways.contains_key(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        let lock = self.record_lock(id);
        let _guard = JsonStore::acquire(&lock);

        let current = self.get(id)?;
        let mut draft = current.clone();
        let output = mutate(&mut draft)?;
        if draft != current {
            self.commit(id, draft)?;
        }
        Ok(output)
    }

    fn list(&self) -> Result<Vec<(String, Giveaway)>> {
        let mut giveaways = self
            .giveaways
            .iter()
            .map(|pair| (pair.key().clone(), pair.value().clone()))
            .collect::<Vec<(String, Giveaway)>>();
        giveaways.sort_by(|left, right| left.0.cmp(&right.0));
        Ok(giveaways)
    }
}

// Serializes the document and replaces the file, retrying transient
// failures a few times before giving up.
fn write_document(path: &Path, document: &GiveawayDocument) -> Result<()> {
    let payload = serde_json::to_string_pretty(document)?;

    let mut attempt = 1;
    loop {
        match replace_file(path, payload.as_bytes()) {
            Ok(()) => return Ok(()),
            Err(err) if attempt < WRITE_ATTEMPTS => {
                warn!(
                    "Can't write the giveaway document {} (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    WRITE_ATTEMPTS,
                    err
                );
                attempt += 1;
                thread::sleep(WRITE_RETRY_DELAY);
            }
            Err(err) => {
                error!(
                    "Giving up on writing the giveaway document {}: {}",
                    path.display(),
                    err
                );
                return Err(Error::from(err));
            }
        }
    }
}

// Writes into a sibling temporary file and renames it over the target, so a
// crash never leaves a half-written document behind.
fn replace_file(path: &Path, payload: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("giveaways.json");
    let temporary = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = File::create(&temporary).and_then(|mut file| {
        file.write_all(payload)?;
        file.sync_all()
    });
    let result = result.and_then(|_| fs::rename(&temporary, path));
    if result.is_err() {
        let _ = fs::remove_file(&temporary);
    }
    result
}
