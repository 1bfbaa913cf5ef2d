use crate::theme::ThemeVariant;

use super::schema::Database;
use super::types::{keys, DatabaseError};

/// Persisted light/dark preference.
///
/// The in-memory value is authoritative for the session: a failed write is
/// logged and reported, but the chosen theme still applies until exit.
pub struct ThemeStore {
    db: Database,
    current: ThemeVariant,
    explicit: bool,
}

impl ThemeStore {
    /// Loads the stored preference, falling back to `fallback` (normally the
    /// detected system preference) when nothing valid is stored.
    pub async fn load(db: Database, fallback: ThemeVariant) -> Self {
        let stored = match db.get(keys::THEME).await {
            Ok(Some(raw)) => {
                let parsed = ThemeVariant::from_str_name(&raw);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "Ignoring unrecognized stored theme");
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read theme preference");
                None
            }
        };

        Self {
            db,
            current: stored.unwrap_or(fallback),
            explicit: stored.is_some(),
        }
    }

    pub fn get(&self) -> ThemeVariant {
        self.current
    }

    /// Whether the current value came from an explicit choice rather than
    /// the fallback.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Applies `variant` immediately and persists it.
    pub async fn set(&mut self, variant: ThemeVariant) -> Result<(), DatabaseError> {
        self.current = variant;
        self.explicit = true;
        self.db.set(keys::THEME, variant.as_str()).await.map_err(|e| {
            tracing::warn!(theme = variant.as_str(), error = %e, "Failed to persist theme");
            e
        })
    }

    /// Switches dark ↔ light. On a persistence error the switch still
    /// applies; see [`ThemeStore::get`].
    pub async fn toggle(&mut self) -> Result<ThemeVariant, DatabaseError> {
        let next = self.current.toggled();
        self.set(next).await.map(|()| next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_uses_fallback() {
        let db = Database::open(":memory:").await.unwrap();
        let store = ThemeStore::load(db, ThemeVariant::Light).await;
        assert_eq!(store.get(), ThemeVariant::Light);
        assert!(!store.is_explicit());
    }

    #[tokio::test]
    async fn test_set_persists_literal() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = ThemeStore::load(db.clone(), ThemeVariant::Dark).await;
        store.set(ThemeVariant::Light).await.unwrap();

        assert_eq!(db.get(keys::THEME).await.unwrap().as_deref(), Some("light"));
        let reloaded = ThemeStore::load(db, ThemeVariant::Dark).await;
        assert_eq!(reloaded.get(), ThemeVariant::Light);
        assert!(reloaded.is_explicit());
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_start() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = ThemeStore::load(db, ThemeVariant::Dark).await;
        assert_eq!(store.toggle().await.unwrap(), ThemeVariant::Light);
        assert_eq!(store.toggle().await.unwrap(), ThemeVariant::Dark);
    }

    #[tokio::test]
    async fn test_invalid_stored_value_falls_back() {
        let db = Database::open(":memory:").await.unwrap();
        db.set(keys::THEME, "solarized").await.unwrap();
        let store = ThemeStore::load(db, ThemeVariant::Dark).await;
        assert_eq!(store.get(), ThemeVariant::Dark);
        assert!(!store.is_explicit());
    }

    #[tokio::test]
    async fn test_persist_failure_still_applies_for_session() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = ThemeStore::load(db.clone(), ThemeVariant::Dark).await;
        db.close().await;

        assert!(store.toggle().await.is_err());
        assert_eq!(store.get(), ThemeVariant::Light);
    }
}
