use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{Error, Result};
use crate::giveaway::models::Giveaway;

/// Keyed persistence for giveaway records.
///
/// `update` is the only way to change an existing record. The closure gets a
/// working copy of the record: when it returns `Ok` the copy is committed,
/// when it returns `Err` nothing is written. Implementations must run the
/// whole read-modify-write atomically with respect to other `create` and
/// `update` calls for the same id, while calls for different ids stay
/// independent.
pub trait GiveawayStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Giveaway>;

    fn create(&self, id: &str, giveaway: Giveaway) -> Result<()>;

    fn update<T, F>(&self, id: &str, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Giveaway) -> Result<T>;

    // Returns every record, ordered by id.
    fn list(&self) -> Result<Vec<(String, Giveaway)>>;
}

/// Keeps everything in memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    giveaways: DashMap<String, Giveaway>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            giveaways: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.giveaways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.giveaways.is_empty()
    }
}

impl GiveawayStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Giveaway> {
        self.giveaways
            .get(id)
            .map(|giveaway| giveaway.value().clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn create(&self, id: &str, giveaway: Giveaway) -> Result<()> {
        match self.giveaways.entry(id.to_string()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists(id.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(giveaway);
                Ok(())
            }
        }
    }

    fn update<T, F>(&self, id: &str, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Giveaway) -> Result<T>,
    {
        // The shard stays write-locked until the guard drops, so concurrent
        // updates of the same record queue up here.
        let mut guard = self
            .giveaways
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut draft = guard.value().clone();
        let output = mutate(&mut draft)?;
        if draft != *guard.value() {
            *guard.value_mut() = draft;
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::error::Error;
    use crate::giveaway::models::{ChannelId, Giveaway, GiveawayOptions, UserId};
    use crate::storage::{GiveawayStore, MemoryStore};

    fn get_giveaway(title: &str) -> Giveaway {
        let options = GiveawayOptions::new().with_title(title);
        Giveaway::new(ChannelId::new(1), &options, 0).unwrap()
    }

    #[test]
    fn test_read_an_new_store() {
        let store = MemoryStore::new();

        assert_eq!(store.list().unwrap().len(), 0);
        assert_eq!(store.is_empty(), true);
    }

    #[test]
    fn test_get_error_for_unknown_id() {
        let store = MemoryStore::new();

        let result = store.get("404");
        assert_eq!(result.is_err(), true);
        assert_eq!(result.unwrap_err(), Error::NotFound("404".to_string()));
    }

    #[test]
    fn test_get_error_for_duplicate_create() {
        let store = MemoryStore::new();
        store.create("1", get_giveaway("first")).unwrap();

        let result = store.create("1", get_giveaway("second"));
        assert_eq!(result.unwrap_err(), Error::AlreadyExists("1".to_string()));
        assert_eq!(store.get("1").unwrap().title(), "first");
    }

    #[test]
    fn test_failed_update_leaves_record_unchanged() {
        let store = MemoryStore::new();
        store.create("1", get_giveaway("first")).unwrap();

        let result: Result<(), Error> = store.update("1", |giveaway| {
            giveaway.title = "changed".to_string();
            Err(Error::InvalidInput("nope".to_string()))
        });
        assert_eq!(result.is_err(), true);
        assert_eq!(store.get("1").unwrap().title(), "first");
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = MemoryStore::new();
        store.create("b", get_giveaway("second")).unwrap();
        store.create("a", get_giveaway("first")).unwrap();

        let ids = store
            .list()
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<String>>();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.create("1", get_giveaway("race")).unwrap();

        let workers = (0..8u64)
            .map(|worker| {
                let store = store.clone();
                thread::spawn(move || {
                    for index in 0..50u64 {
                        store
                            .update("1", |giveaway| {
                                giveaway.participants.insert(UserId::new(worker * 1000 + index));
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.get("1").unwrap().participants().len(), 400);
    }
}
