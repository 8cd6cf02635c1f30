use color_eyre::Result;
use tracing::instrument;

use crate::storage::{EncryptedStore, Preferences};

/// All stored preferences, ordered by key.
pub async fn list(store: &EncryptedStore<Preferences>) -> Result<Preferences> {
    Ok(store.read().await?)
}

pub async fn get(store: &EncryptedStore<Preferences>, key: &str) -> Result<Option<String>> {
    Ok(store.read().await?.get(key).cloned())
}

#[instrument(skip(store, value))]
pub async fn set(store: &EncryptedStore<Preferences>, key: String, value: String) -> Result<()> {
    store
        .update(|mut prefs| {
            prefs.insert(key, value);
            prefs
        })
        .await?;
    Ok(())
}

/// Remove `key`; returns whether it was present.
#[instrument(skip(store))]
pub async fn unset(store: &EncryptedStore<Preferences>, key: &str) -> Result<bool> {
    if !store.read().await?.contains_key(key) {
        return Ok(false);
    }

    let mut removed = false;
    store
        .update(|mut prefs| {
            removed = prefs.remove(key).is_some();
            prefs
        })
        .await?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;
    use cipherstore_storage::{file_store::CorruptionPolicy, key_provider::InMemoryKeyProvider};

    #[tokio::test]
    async fn set_get_and_unset_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = InMemoryKeyProvider::default();
        let store = storage::preference_store(dir.path(), &provider, CorruptionPolicy::Fail)
            .await
            .expect("store");

        assert!(list(&store).await.expect("list").is_empty());
        set(&store, "theme".into(), "dark".into()).await.expect("set");
        set(&store, "lang".into(), "en".into()).await.expect("set");
        assert_eq!(get(&store, "theme").await.expect("get").as_deref(), Some("dark"));

        assert!(unset(&store, "theme").await.expect("unset"));
        assert!(!unset(&store, "theme").await.expect("unset again"));

        let remaining: Vec<_> = list(&store).await.expect("list").into_keys().collect();
        assert_eq!(remaining, vec!["lang".to_string()]);
    }

    #[tokio::test]
    async fn unset_of_missing_key_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = InMemoryKeyProvider::default();
        let store = storage::preference_store(dir.path(), &provider, CorruptionPolicy::Fail)
            .await
            .expect("store");

        assert!(!unset(&store, "ghost").await.expect("unset on empty store"));
        assert!(!store.path().exists(), "no file created for a no-op unset");

        set(&store, "theme".into(), "dark".into()).await.expect("set");
        let before = std::fs::read(store.path()).expect("read ciphertext");
        assert!(!unset(&store, "ghost").await.expect("unset"));
        let after = std::fs::read(store.path()).expect("read ciphertext");
        assert_eq!(before, after, "ciphertext must not be rewritten");
    }

    #[tokio::test]
    async fn values_survive_reopening_with_the_same_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = InMemoryKeyProvider::default();
        let first = storage::preference_store(dir.path(), &provider, CorruptionPolicy::Fail)
            .await
            .expect("store");
        set(&first, "editor".into(), "hx".into()).await.expect("set");

        let reopened = storage::preference_store(dir.path(), &provider, CorruptionPolicy::Fail)
            .await
            .expect("store");
        assert_eq!(
            get(&reopened, "editor").await.expect("get").as_deref(),
            Some("hx")
        );
    }
}
