use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use bazaar_core::{DomainResult, TenantId};

use crate::error::StoreError;

/// Tenant-isolated key/value store.
///
/// Every read and write is scoped by `TenantId`; a key from one tenant is
/// invisible to another.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;
    fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError>;
    fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;
    fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError>;

    /// Read-modify-write under the store's write lock.
    ///
    /// `f` runs on a copy; the copy is stored only when `f` succeeds.
    /// A missing key yields `DomainError::NotFound`.
    fn modify(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError>;

    /// Like `modify`, but starts from `init` when the key is missing.
    fn modify_or_insert(
        &self,
        tenant_id: TenantId,
        key: K,
        init: V,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError>;

    /// Every record across tenants, for background sweeps.
    fn scan(&self) -> Result<Vec<V>, StoreError>;
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(tenant_id, key, value)
    }

    fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).remove(tenant_id, key)
    }

    fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        (**self).list(tenant_id)
    }

    fn modify(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError> {
        (**self).modify(tenant_id, key, f)
    }

    fn modify_or_insert(
        &self,
        tenant_id: TenantId,
        key: K,
        init: V,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError> {
        (**self).modify_or_insert(tenant_id, key, init, f)
    }

    fn scan(&self) -> Result<Vec<V>, StoreError> {
        (**self).scan()
    }
}

/// In-memory tenant-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&(tenant_id, key.clone())).cloned())
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        map.insert((tenant_id, key), value);
        Ok(())
    }

    fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(&(tenant_id, key.clone())))
    }

    fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map
            .iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect())
    }

    fn modify(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let slot = map
            .get_mut(&(tenant_id, key.clone()))
            .ok_or(bazaar_core::DomainError::NotFound)?;
        let mut next = slot.clone();
        f(&mut next)?;
        *slot = next.clone();
        Ok(next)
    }

    fn modify_or_insert(
        &self,
        tenant_id: TenantId,
        key: K,
        init: V,
        f: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> Result<V, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let slot = (tenant_id, key);
        let mut next = map.get(&slot).cloned().unwrap_or(init);
        f(&mut next)?;
        map.insert(slot, next.clone());
        Ok(next)
    }

    fn scan(&self) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().cloned().collect())
    }
}
