use crate::txt_store::{normalize_name, TxtStore};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An in-memory [`TxtStore`]. Lookups share a read lock, updates take the write lock for the
/// duration of the map operation only.
#[derive(Default, Debug)]
pub struct InMemoryTxtStore {
    txt_records: RwLock<HashMap<String, String>>,
}

impl InMemoryTxtStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// A poisoned lock is recovered: every map operation below is a single insert/remove/get, so a
// panicking holder can't leave a half-applied update behind.
impl TxtStore for InMemoryTxtStore {
    fn set_txt(&self, domain: &str, value: String) {
        let fqdn = normalize_name(domain);
        tracing::info!("TXT record set: {fqdn} -> {value}");
        self.txt_records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fqdn, value);
    }

    fn clear_txt(&self, domain: &str) {
        let fqdn = normalize_name(domain);
        let removed = self
            .txt_records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&fqdn);
        match removed {
            Some(_) => tracing::info!("TXT record cleared: {fqdn}"),
            None => tracing::debug!("TXT record clear for absent {fqdn}"),
        }
    }

    fn get_txt(&self, domain: &str) -> Option<String> {
        self.txt_records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_name(domain))
            .cloned()
    }

    fn len(&self) -> usize {
        self.txt_records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txt_store::DynTxtStore;
    use std::sync::Arc;

    #[test]
    fn set_get_any_casing_or_trailing_dot() {
        let store = InMemoryTxtStore::new();
        store.set_txt("_acme-challenge.Example.COM.", "abc123".to_string());

        for name in [
            "_acme-challenge.example.com",
            "_acme-challenge.example.com.",
            "_ACME-CHALLENGE.EXAMPLE.COM",
            "_Acme-Challenge.eXample.com.",
        ] {
            assert_eq!(store.get_txt(name).as_deref(), Some("abc123"), "{name}");
        }
        assert_eq!(store.get_txt("example.com"), None);
    }

    #[test]
    fn set_overwrites() {
        let store = InMemoryTxtStore::new();
        store.set_txt("a.example.com", "first".to_string());
        store.set_txt("A.example.com.", "second".to_string());
        assert_eq!(store.get_txt("a.example.com").as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear() {
        let store = InMemoryTxtStore::new();
        store.set_txt("a.example.com", "v".to_string());
        store.clear_txt("A.EXAMPLE.COM.");
        assert_eq!(store.get_txt("a.example.com"), None);
        assert!(store.is_empty());

        // Clearing an absent name is a no-op.
        store.clear_txt("never.example.com");
        store.clear_txt("a.example.com");
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_access_never_tears_values() {
        const DOMAINS: usize = 8;
        const ROUNDS: usize = 500;
        let store: DynTxtStore = Arc::new(InMemoryTxtStore::new());

        let mut tasks = Vec::default();
        for writer in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for round in 0..ROUNDS {
                    let domain = format!("d{}.example.com", round % DOMAINS);
                    if round % 5 == 0 {
                        store.clear_txt(&domain);
                    } else {
                        // Every value is a single repeated character, so a torn write would show
                        // up as a mixed string.
                        let c = char::from(b'a' + u8::try_from(writer).unwrap());
                        store.set_txt(&domain, c.to_string().repeat(64));
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }
        for _ in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for round in 0..ROUNDS {
                    let domain = format!("D{}.EXAMPLE.COM.", round % DOMAINS);
                    if let Some(value) = store.get_txt(&domain) {
                        assert_eq!(value.len(), 64);
                        let first = value.chars().next().unwrap();
                        assert!(value.chars().all(|c| c == first), "torn value {value}");
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(store.len() <= DOMAINS);
    }
}
