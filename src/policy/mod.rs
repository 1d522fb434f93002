//! Registration eligibility policy
//!
//! Pure decision core shared by event cards and registration enforcement.
//! Nothing here touches the clock, the database, or Telegram: "today" and the
//! existing registrations are always passed in.

pub mod decision;
pub mod error;
pub mod registration;

pub use decision::{
    days_between, evaluate, Countdown, EffectiveStatus, RegistrationDecision,
    REGISTRATION_CUTOFF_DAYS,
};
pub use error::{PolicyError, PolicyResult};
pub use registration::{register_user, unregister_user, NewRegistration};
