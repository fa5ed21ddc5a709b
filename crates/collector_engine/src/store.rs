use std::collections::{BTreeMap, HashMap};

use collector_core::{ClassifiedMessage, Package, PackageId};
use collector_logging::{collector_error, collector_info, collector_warn};

use crate::persist::{BlobStore, PersistError};

/// Storage key the package blob lives under unless configured otherwise.
pub const PACKAGES_STORAGE_KEY: &str = "json_packages";

/// All packages, open and finalized, mirrored to a single blob.
///
/// Names are unique: creating a package under an existing name replaces it.
pub struct PackageStore {
    packages: BTreeMap<PackageId, Package>,
    by_name: HashMap<String, PackageId>,
    blobs: Box<dyn BlobStore>,
    key: String,
}

impl PackageStore {
    /// Loads the persisted blob. Missing, unreadable or corrupt data yields
    /// an empty store.
    pub fn load(blobs: Box<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut store = Self {
            packages: BTreeMap::new(),
            by_name: HashMap::new(),
            blobs,
            key,
        };

        let loaded = match store.blobs.load_blob(&store.key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Package>>(&bytes) {
                Ok(packages) => packages,
                Err(err) => {
                    collector_warn!("Ignoring corrupt package blob {:?}: {}", store.key, err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                collector_warn!("Failed to read package blob {:?}: {}", store.key, err);
                Vec::new()
            }
        };

        for package in loaded {
            store.insert(package);
        }
        if !store.packages.is_empty() {
            collector_info!("Loaded {} persisted packages", store.packages.len());
        }
        store
    }

    /// Creates an empty open package, deleting any package with the same name.
    pub fn create_or_replace(&mut self, id: PackageId, name: &str, created_at: i64) -> Package {
        let package = Package::open(id, name, created_at);
        self.insert(package.clone());
        self.persist();
        package
    }

    /// Overwrites the item list of a package. Returns false if it is unknown.
    pub fn replace_items(&mut self, id: PackageId, items: Vec<ClassifiedMessage>) -> bool {
        let Some(package) = self.packages.get_mut(&id) else {
            return false;
        };
        package.items = items;
        self.persist();
        true
    }

    /// Stores the final items and marks the package complete.
    pub fn finalize(&mut self, id: PackageId, items: Vec<ClassifiedMessage>) -> Option<Package> {
        let package = self.packages.get_mut(&id)?;
        package.items = items;
        package.complete = true;
        let finalized = package.clone();
        self.persist();
        Some(finalized)
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Package> {
        self.by_name.get(name).and_then(|id| self.packages.get(id))
    }

    /// Every package in creation order.
    pub fn list_all(&self) -> Vec<&Package> {
        self.packages.values().collect()
    }

    pub fn last_id(&self) -> Option<PackageId> {
        self.packages.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Removes a package; unknown ids are a no-op.
    pub fn delete(&mut self, id: PackageId) -> Option<Package> {
        let removed = self.packages.remove(&id)?;
        self.by_name.remove(&removed.name);
        self.persist();
        Some(removed)
    }

    /// Removes a package by name; unknown names are a no-op.
    pub fn delete_by_name(&mut self, name: &str) -> Option<Package> {
        let id = *self.by_name.get(name)?;
        self.delete(id)
    }

    /// Drops every package and removes the blob entirely.
    pub fn clear_all(&mut self) {
        self.packages.clear();
        self.by_name.clear();
        if let Err(err) = self.blobs.remove_blob(&self.key) {
            collector_error!("Failed to remove package blob {:?}: {}", self.key, err);
        }
    }

    fn insert(&mut self, package: Package) {
        if let Some(previous) = self.by_name.insert(package.name.clone(), package.id) {
            if previous != package.id {
                self.packages.remove(&previous);
            }
        }
        self.packages.insert(package.id, package);
    }

    fn persist(&mut self) {
        if let Err(err) = self.try_persist() {
            collector_error!("Failed to persist packages under {:?}: {}", self.key, err);
        }
    }

    fn try_persist(&mut self) -> Result<(), PersistError> {
        let packages: Vec<&Package> = self.packages.values().collect();
        let bytes = serde_json::to_vec(&packages)?;
        self.blobs.save_blob(&self.key, &bytes)
    }
}
