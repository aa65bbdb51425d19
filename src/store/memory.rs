use std::collections::HashMap;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::meals::MealEntry;
use crate::profile::Profile;
use crate::store::SessionStore;

/// In-memory key-value store holding JSON-serialized records.
///
/// Keys follow the `{kind}:{user_id}` layout; credentials are stored as
/// Argon2 hashes, never as the plain secret.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

fn profile_key(user_id: &str) -> String {
    format!("profile:{user_id}")
}

fn meals_key(user_id: &str) -> String {
    format!("meals:{user_id}")
}

fn auth_key(user_id: &str) -> String {
    format!("auth:{user_id}")
}

fn hash_secret(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_secret(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save_profile(&self, profile: &Profile, user_id: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string(profile)?;
        self.entries.write().await.insert(profile_key(user_id), json);
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>> {
        let entries = self.entries.read().await;
        let Some(json) = entries.get(&profile_key(user_id)) else {
            return Ok(None);
        };
        match serde_json::from_str(json) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "stored profile is malformed; ignoring");
                Ok(None)
            }
        }
    }

    async fn save_meals(&self, meals: &[MealEntry], user_id: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string(meals)?;
        self.entries.write().await.insert(meals_key(user_id), json);
        Ok(())
    }

    async fn load_meals(&self, user_id: &str) -> anyhow::Result<Vec<MealEntry>> {
        let entries = self.entries.read().await;
        let Some(json) = entries.get(&meals_key(user_id)) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(json) {
            Ok(meals) => Ok(meals),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "stored meal list is malformed; ignoring");
                Ok(Vec::new())
            }
        }
    }

    async fn save_credential(&self, user_id: &str, secret: &str) -> anyhow::Result<()> {
        let hash = hash_secret(secret)?;
        self.entries.write().await.insert(auth_key(user_id), hash);
        Ok(())
    }

    async fn validate_credential(&self, user_id: &str, secret: &str) -> anyhow::Result<bool> {
        let entries = self.entries.read().await;
        let Some(hash) = entries.get(&auth_key(user_id)) else {
            return Ok(false);
        };
        verify_secret(secret, hash)
    }

    async fn user_exists(&self, user_id: &str) -> anyhow::Result<bool> {
        Ok(self.entries.read().await.contains_key(&auth_key(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(date: &str, kcal: u32) -> MealEntry {
        MealEntry {
            name: "test".into(),
            calories_kcal: kcal,
            protein_g: 1,
            carbs_g: 2,
            fat_g: 3,
            date: date.into(),
            source_description: None,
        }
    }

    #[tokio::test]
    async fn profile_roundtrip_per_user() {
        let store = MemoryStore::new();
        let p = Profile::new("Ana", 30, false, 62.0, 168.0, None).expect("valid profile");
        store.save_profile(&p, "ana").await.expect("save");

        let loaded = store.load_profile("ana").await.expect("load");
        assert_eq!(loaded, Some(p));
        assert_eq!(store.load_profile("bob").await.expect("load"), None);
    }

    #[tokio::test]
    async fn meals_roundtrip_preserves_order() {
        let store = MemoryStore::new();
        let meals = vec![meal("2024-01-01", 300), meal("2024-01-01", 150), meal("2024-01-02", 900)];
        store.save_meals(&meals, "ana").await.expect("save");

        assert_eq!(store.load_meals("ana").await.expect("load"), meals);
        assert!(store.load_meals("bob").await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn credentials_hash_and_validate() {
        let store = MemoryStore::new();
        store.save_credential("ana", "s3cret").await.expect("save");

        assert!(store.user_exists("ana").await.expect("exists"));
        assert!(!store.user_exists("bob").await.expect("exists"));
        assert!(store.validate_credential("ana", "s3cret").await.expect("validate"));
        assert!(!store.validate_credential("ana", "wrong").await.expect("validate"));
        assert!(!store.validate_credential("bob", "s3cret").await.expect("validate"));
    }

    #[tokio::test]
    async fn stored_secret_is_not_plaintext() {
        let store = MemoryStore::new();
        store.save_credential("ana", "s3cret").await.expect("save");
        let entries = store.entries.read().await;
        let stored = entries.get("auth:ana").expect("credential stored");
        assert_ne!(stored, "s3cret");
        assert!(stored.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn malformed_stored_profile_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .entries
            .write()
            .await
            .insert("profile:ana".into(), "{not json".into());
        assert_eq!(store.load_profile("ana").await.expect("load"), None);
    }
}
