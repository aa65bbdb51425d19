use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::budget::{BudgetStrategy, MifflinStJeor};
use crate::error::SessionError;
use crate::meals::ledger::{self, DayStatus};
use crate::meals::{today_utc, MealEntry};
use crate::profile::Profile;
use crate::recognizer::MealRecognizer;
use crate::store::SessionStore;

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex =
            Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{2,31}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Owner of the active session: current user identity, biometric profile,
/// meal ledger, and the recognition-in-flight flag.
///
/// State lives in watch channels so the presentation layer can subscribe
/// to changes; the channels are also the single in-memory source of truth.
/// Persisted state is read only at login/register time. One active session
/// per process is assumed: concurrent commands for the same user are the
/// caller's responsibility to avoid, except that logging out during an
/// in-flight recognition is tolerated (the stale result is discarded).
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    recognizer: Arc<dyn MealRecognizer>,
    budget: Arc<dyn BudgetStrategy>,
    user_tx: watch::Sender<Option<String>>,
    profile_tx: watch::Sender<Option<Profile>>,
    meals_tx: watch::Sender<Vec<MealEntry>>,
    loading_tx: watch::Sender<bool>,
    daily_alert_shown: AtomicBool,
}

/// Resets the loading flag when dropped, so the flag clears on every exit
/// path of a recognition, panics included.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, recognizer: Arc<dyn MealRecognizer>) -> Self {
        Self::with_strategy(store, recognizer, Arc::new(MifflinStJeor::default()))
    }

    pub fn with_strategy(
        store: Arc<dyn SessionStore>,
        recognizer: Arc<dyn MealRecognizer>,
        budget: Arc<dyn BudgetStrategy>,
    ) -> Self {
        let (user_tx, _) = watch::channel(None);
        let (profile_tx, _) = watch::channel(None);
        let (meals_tx, _) = watch::channel(Vec::new());
        let (loading_tx, _) = watch::channel(false);
        Self {
            store,
            recognizer,
            budget,
            user_tx,
            profile_tx,
            meals_tx,
            loading_tx,
            daily_alert_shown: AtomicBool::new(false),
        }
    }

    // --- state reads ---

    pub fn current_user_id(&self) -> Option<String> {
        self.user_tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_tx.borrow().is_some()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profile_tx.borrow().clone()
    }

    pub fn ledger(&self) -> Vec<MealEntry> {
        self.meals_tx.borrow().clone()
    }

    pub fn is_recognition_in_flight(&self) -> bool {
        *self.loading_tx.borrow()
    }

    pub fn watch_profile(&self) -> watch::Receiver<Option<Profile>> {
        self.profile_tx.subscribe()
    }

    pub fn watch_ledger(&self) -> watch::Receiver<Vec<MealEntry>> {
        self.meals_tx.subscribe()
    }

    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    pub fn daily_alert_shown(&self) -> bool {
        self.daily_alert_shown.load(Ordering::Relaxed)
    }

    pub fn mark_daily_alert_shown(&self) {
        self.daily_alert_shown.store(true, Ordering::Relaxed);
    }

    // --- authentication ---

    /// Validate credentials and, on success, load the user's persisted
    /// profile and ledger into the session. On failure nothing changes.
    #[instrument(skip(self, secret))]
    pub async fn login(&self, user_id: &str, secret: &str) -> Result<(), SessionError> {
        if !self.store.validate_credential(user_id, secret).await? {
            warn!(user_id = %user_id, "login rejected");
            return Err(SessionError::AuthenticationFailed);
        }

        let profile = self.store.load_profile(user_id).await?;
        let meals = self.store.load_meals(user_id).await?;

        self.user_tx.send_replace(Some(user_id.to_owned()));
        self.profile_tx.send_replace(profile);
        self.meals_tx.send_replace(meals);
        self.daily_alert_shown.store(false, Ordering::Relaxed);
        info!(user_id = %user_id, "logged in");
        Ok(())
    }

    /// Create a new user with an initial profile and an empty ledger, then
    /// start their session. An already-taken username changes nothing.
    #[instrument(skip(self, secret, profile))]
    pub async fn register(
        &self,
        user_id: &str,
        secret: &str,
        profile: Profile,
    ) -> Result<(), SessionError> {
        if !is_valid_username(user_id) {
            warn!(user_id = %user_id, "invalid username");
            return Err(SessionError::InvalidUsername);
        }
        if self.store.user_exists(user_id).await? {
            warn!(user_id = %user_id, "username already registered");
            return Err(SessionError::DuplicateUser(user_id.to_owned()));
        }

        self.store.save_credential(user_id, secret).await?;
        self.store.save_profile(&profile, user_id).await?;

        self.user_tx.send_replace(Some(user_id.to_owned()));
        self.profile_tx.send_replace(Some(profile));
        self.meals_tx.send_replace(Vec::new());
        self.daily_alert_shown.store(false, Ordering::Relaxed);
        info!(user_id = %user_id, "registered");
        Ok(())
    }

    /// Clear user identity, profile, and ledger unconditionally.
    pub fn logout(&self) {
        let previous = self.user_tx.send_replace(None);
        self.profile_tx.send_replace(None);
        self.meals_tx.send_replace(Vec::new());
        self.daily_alert_shown.store(false, Ordering::Relaxed);
        if let Some(user) = previous {
            info!(user_id = %user, "logged out");
        }
    }

    // --- profile updates ---

    /// Replace the current profile and persist it. No-op when logged out.
    pub async fn update_profile(&self, profile: Profile) -> Result<(), SessionError> {
        let Some(user_id) = self.current_user_id() else {
            debug!("update_profile ignored: not logged in");
            return Ok(());
        };
        self.profile_tx.send_replace(Some(profile.clone()));
        if let Err(e) = self.store.save_profile(&profile, &user_id).await {
            error!(user_id = %user_id, error = %e, "profile write failed");
            return Err(SessionError::Persistence(e));
        }
        Ok(())
    }

    /// Replace only the photo reference, keeping every other field.
    pub async fn update_photo(&self, photo_ref: &str) -> Result<(), SessionError> {
        let Some(current) = self.profile() else {
            debug!("update_photo ignored: no profile");
            return Ok(());
        };
        self.update_profile(current.with_photo(photo_ref)).await
    }

    /// Replace only weight and height, keeping name, age, and photo.
    pub async fn update_physical_stats(
        &self,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<(), SessionError> {
        let Some(current) = self.profile() else {
            debug!("update_physical_stats ignored: no profile");
            return Ok(());
        };
        let updated = current.with_physical_stats(weight_kg, height_cm)?;
        self.update_profile(updated).await
    }

    // --- meal ledger ---

    /// Append a meal to the ledger and persist the full list. The in-memory
    /// ledger is updated even if the write fails; the failure is still
    /// reported. No-op when logged out.
    pub async fn record_meal(&self, entry: MealEntry) -> Result<(), SessionError> {
        let Some(user_id) = self.current_user_id() else {
            debug!("record_meal ignored: not logged in");
            return Ok(());
        };
        self.meals_tx.send_modify(|meals| meals.push(entry));
        let snapshot = self.ledger();
        if let Err(e) = self.store.save_meals(&snapshot, &user_id).await {
            error!(user_id = %user_id, error = %e, "ledger write failed");
            return Err(SessionError::Persistence(e));
        }
        Ok(())
    }

    /// Run the recognizer over a photo and record the resulting entry.
    ///
    /// Recognition failures are absorbed here: they are logged and leave the
    /// ledger untouched. The loading flag is cleared on every path. The user
    /// id is captured at call start; if the session changed by the time the
    /// recognizer answers, the result is discarded instead of being
    /// attributed to whoever is logged in now.
    #[instrument(skip(self, image, description))]
    pub async fn recognize_and_record(&self, image: Bytes, description: &str) {
        let Some(started_user) = self.current_user_id() else {
            debug!("recognize_and_record ignored: not logged in");
            return;
        };

        self.loading_tx.send_replace(true);
        let _guard = LoadingGuard(&self.loading_tx);

        match self.recognizer.recognize(image, description).await {
            Ok(entry) => {
                if self.current_user_id().as_deref() != Some(started_user.as_str()) {
                    warn!(user_id = %started_user, "session changed during recognition; discarding result");
                    return;
                }
                if let Err(e) = self.record_meal(entry).await {
                    error!(user_id = %started_user, error = %e, "failed to persist recognized meal");
                }
            }
            Err(e) => {
                warn!(user_id = %started_user, error = %e, "meal recognition failed");
            }
        }
    }

    // --- derived queries ---

    /// Calories recorded for today's UTC date. Zero when logged out.
    pub fn total_consumed_today(&self) -> u64 {
        ledger::total_for_date(&self.meals_tx.borrow(), &today_utc())
    }

    /// Daily caloric budget from the configured strategy; zero without a
    /// profile.
    pub fn budget_today(&self) -> u32 {
        self.profile_tx
            .borrow()
            .as_ref()
            .map(|p| self.budget.daily_budget(p))
            .unwrap_or(0)
    }

    /// Per-date adherence classification of the current ledger.
    pub fn day_status_map(&self) -> HashMap<String, DayStatus> {
        ledger::day_status_map(&self.meals_tx.borrow(), self.budget_today())
    }
}
