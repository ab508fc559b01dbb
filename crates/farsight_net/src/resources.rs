//! # Resource Sync
//!
//! Content-addressed resource bookkeeping for both ends of a handshake.
//!
//! The provider keeps a [`ResourceStore`] and announces a descriptor with an
//! 8-byte hash for every entry. The display keeps a [`ResourceCache`] that
//! survives reconnects and only requests entries whose hash changed.

use std::collections::BTreeMap;
use std::hash::Hasher;

use farsight_shared::protocol::ResourceDescriptor;
use farsight_shared::{ResourceId, ResourceKind};
use siphasher::sip::SipHasher24;

const HASH_KEY_0: u64 = 0x6661_7273_6967_6874;
const HASH_KEY_1: u64 = 0x7265_736f_7572_6365;

/// Computes the 8-byte content hash of a resource payload.
#[must_use]
pub fn content_hash(data: &[u8]) -> [u8; 8] {
    let mut hasher = SipHasher24::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(data);
    hasher.finish().to_le_bytes()
}

/// One resource with its cached hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Content hash of `data`.
    pub hash: [u8; 8],
    /// Raw payload.
    pub data: Vec<u8>,
}

impl StoredResource {
    /// Wraps a payload, hashing it.
    #[must_use]
    pub fn new(kind: ResourceKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            hash: content_hash(&data),
            data,
        }
    }

    /// Builds the handshake descriptor for this entry.
    #[must_use]
    pub fn descriptor(&self, id: ResourceId) -> ResourceDescriptor {
        ResourceDescriptor {
            id: id.raw(),
            kind: self.kind as u32,
            size: self.data.len() as u32,
            hash: self.hash,
        }
    }
}

/// Provider-side resource table.
#[derive(Clone, Debug, Default)]
pub struct ResourceStore {
    entries: BTreeMap<ResourceId, StoredResource>,
}

impl ResourceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, id: ResourceId, kind: ResourceKind, data: Vec<u8>) {
        self.entries.insert(id, StoredResource::new(kind, data));
    }

    /// Removes a resource.
    pub fn remove(&mut self, id: ResourceId) -> Option<StoredResource> {
        self.entries.remove(&id)
    }

    /// Looks up a resource.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&StoredResource> {
        self.entries.get(&id)
    }

    /// Descriptors for every entry, ordered by id.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        self.entries.iter().map(|(id, res)| res.descriptor(*id)).collect()
    }

    /// Entries that are new or whose hash changed compared to `earlier`.
    pub fn changed_since<'a>(
        &'a self,
        earlier: &'a Self,
    ) -> impl Iterator<Item = (ResourceId, &'a StoredResource)> + 'a {
        self.entries
            .iter()
            .filter(|(id, res)| earlier.entries.get(*id).map_or(true, |old| old.hash != res.hash))
            .map(|(id, res)| (*id, res))
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display-side cache of resources received in earlier sessions.
#[derive(Clone, Debug, Default)]
pub struct ResourceCache {
    entries: BTreeMap<ResourceId, StoredResource>,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids from `descriptors` that are missing or whose hash differs.
    #[must_use]
    pub fn missing(&self, descriptors: &[ResourceDescriptor]) -> Vec<ResourceId> {
        descriptors
            .iter()
            .filter(|desc| {
                let id = ResourceId(desc.id);
                let hash = desc.hash;
                self.entries.get(&id).map_or(true, |cached| cached.hash != hash)
            })
            .map(|desc| ResourceId(desc.id))
            .collect()
    }

    /// Stores a payload received from the provider.
    pub fn insert(&mut self, id: ResourceId, kind: ResourceKind, data: Vec<u8>) {
        self.entries.insert(id, StoredResource::new(kind, data));
    }

    /// Looks up a cached resource.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&StoredResource> {
        self.entries.get(&id)
    }

    /// Iterates all cached resources.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &StoredResource)> {
        self.entries.iter().map(|(id, res)| (*id, res))
    }

    /// Number of cached resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_content_addressed() {
        assert_eq!(content_hash(b"layout"), content_hash(b"layout"));
        assert_ne!(content_hash(b"layout"), content_hash(b"layouT"));
    }

    #[test]
    fn test_cache_requests_only_changed() {
        let mut store = ResourceStore::new();
        store.insert(ResourceId(1), ResourceKind::Layout, vec![1, 0]);
        store.insert(ResourceId(2), ResourceKind::Bitmap, vec![7; 32]);

        let mut cache = ResourceCache::new();
        assert_eq!(cache.missing(&store.descriptors()), vec![ResourceId(1), ResourceId(2)]);

        cache.insert(ResourceId(1), ResourceKind::Layout, vec![1, 0]);
        cache.insert(ResourceId(2), ResourceKind::Bitmap, vec![7; 32]);
        assert!(cache.missing(&store.descriptors()).is_empty());

        store.insert(ResourceId(2), ResourceKind::Bitmap, vec![8; 32]);
        assert_eq!(cache.missing(&store.descriptors()), vec![ResourceId(2)]);
    }

    #[test]
    fn test_changed_since_snapshot() {
        let mut store = ResourceStore::new();
        store.insert(ResourceId(1), ResourceKind::Layout, vec![1, 0]);
        store.insert(ResourceId(2), ResourceKind::Drawing, vec![2]);
        let snapshot = store.clone();
        assert_eq!(store.changed_since(&snapshot).count(), 0);

        store.insert(ResourceId(2), ResourceKind::Drawing, vec![3]);
        store.insert(ResourceId(4), ResourceKind::Drawing, vec![4]);
        store.insert(ResourceId(1), ResourceKind::Layout, vec![1, 0]);
        let ids: Vec<_> = store.changed_since(&snapshot).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ResourceId(2), ResourceId(4)]);
    }

    #[test]
    fn test_descriptor_fields() {
        let res = StoredResource::new(ResourceKind::Bitmap, vec![0; 10]);
        let desc = res.descriptor(ResourceId(5));
        let (id, kind, size) = (desc.id, desc.kind, desc.size);
        assert_eq!((id, kind, size), (5, 1, 10));
    }
}
