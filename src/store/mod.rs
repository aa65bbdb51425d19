use async_trait::async_trait;

use crate::meals::MealEntry;
use crate::profile::Profile;

mod memory;

pub use memory::MemoryStore;

/// Persistence adapter consumed by the session manager.
///
/// Profiles and meal lists are stored per user; credentials are written at
/// registration and only ever read back through [`validate_credential`] —
/// the secret never crosses this boundary in the other direction.
///
/// [`validate_credential`]: SessionStore::validate_credential
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_profile(&self, profile: &Profile, user_id: &str) -> anyhow::Result<()>;
    async fn load_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>>;

    async fn save_meals(&self, meals: &[MealEntry], user_id: &str) -> anyhow::Result<()>;
    async fn load_meals(&self, user_id: &str) -> anyhow::Result<Vec<MealEntry>>;

    async fn save_credential(&self, user_id: &str, secret: &str) -> anyhow::Result<()>;
    async fn validate_credential(&self, user_id: &str, secret: &str) -> anyhow::Result<bool>;
    async fn user_exists(&self, user_id: &str) -> anyhow::Result<bool>;
}
