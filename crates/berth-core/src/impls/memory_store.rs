//! InMemoryPropertyStore - テスト用の PropertyStore
//!
//! # 実装詳細
//! - BTreeMap<(scope, app), BTreeMap<key, Vec<value>>> で管理
//! - 単一値は長さ 1 のリストとして保存

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::BerthError;
use crate::ports::PropertyStore;

type Entries = BTreeMap<String, Vec<String>>;

#[derive(Default)]
pub struct InMemoryPropertyStore {
    scopes: Mutex<BTreeMap<(String, String), Entries>>,
    set_up: Mutex<BTreeSet<String>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key/value of `app` in `scope`.
    pub fn snapshot(&self, scope: &str, app: &str) -> Entries {
        self.map()
            .get(&(scope.to_string(), app.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_set_up(&self, scope: &str) -> bool {
        self.set_up
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(scope)
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<(String, String), Entries>> {
        self.scopes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn scope_key(scope: &str, app: &str) -> (String, String) {
    (scope.to_string(), app.to_string())
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn write(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        value: &str,
    ) -> Result<(), BerthError> {
        self.map()
            .entry(scope_key(scope, app))
            .or_default()
            .insert(key.to_string(), vec![value.to_string()]);
        Ok(())
    }

    async fn write_list(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        values: &[String],
    ) -> Result<(), BerthError> {
        self.map()
            .entry(scope_key(scope, app))
            .or_default()
            .insert(key.to_string(), values.to_vec());
        Ok(())
    }

    async fn get(&self, scope: &str, app: &str, key: &str) -> Result<String, BerthError> {
        Ok(self
            .map()
            .get(&scope_key(scope, app))
            .and_then(|entries| entries.get(key))
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_list(
        &self,
        scope: &str,
        app: &str,
        key: &str,
    ) -> Result<Vec<String>, BerthError> {
        Ok(self
            .map()
            .get(&scope_key(scope, app))
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_default())
    }

    async fn exists(&self, scope: &str, app: &str, key: &str) -> Result<bool, BerthError> {
        Ok(self
            .map()
            .get(&scope_key(scope, app))
            .is_some_and(|entries| entries.contains_key(key)))
    }

    async fn delete(&self, scope: &str, app: &str, key: &str) -> Result<(), BerthError> {
        if let Some(entries) = self.map().get_mut(&scope_key(scope, app)) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn destroy_scope(&self, scope: &str, app: &str) -> Result<(), BerthError> {
        self.map().remove(&scope_key(scope, app));
        Ok(())
    }

    async fn clone_scope(&self, scope: &str, old: &str, new: &str) -> Result<(), BerthError> {
        let mut map = self.map();
        let Some(entries) = map.get(&scope_key(scope, old)).cloned() else {
            return Ok(());
        };
        let target = map.entry(scope_key(scope, new)).or_default();
        for (key, values) in entries {
            target.insert(key, values);
        }
        Ok(())
    }

    async fn setup_scope(&self, scope: &str) -> Result<(), BerthError> {
        self.set_up
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(scope.to_string());
        Ok(())
    }
}
