//! Session and ledger core for a photo-based nutrition tracker.
//!
//! [`SessionManager`] owns the active user session: the biometric profile,
//! the append-only meal ledger, and the orchestration of the persistence
//! store and the AI meal recognizer. Budget estimation and day-by-day
//! adherence classification live in [`budget`] and [`meals::ledger`].

pub mod budget;
pub mod config;
pub mod error;
pub mod meals;
pub mod profile;
pub mod recognizer;
pub mod session;
pub mod store;
pub mod telemetry;

pub use budget::{BudgetStrategy, HarrisBenedict, MifflinStJeor};
pub use error::SessionError;
pub use meals::ledger::DayStatus;
pub use meals::MealEntry;
pub use profile::Profile;
pub use recognizer::{MealRecognizer, RecognitionError};
pub use session::SessionManager;
pub use store::{MemoryStore, SessionStore};
