//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod news;

// Re-export commonly used models
pub use user::{User, CreateUserRequest, UpdateUserRequest};
pub use event::{Event, EventSummary, EventStatus, CreateEventRequest, UpdateEventRequest};
pub use registration::{Registration, Participant, RegisteredEvent};
pub use news::{News, CreateNewsRequest, UpdateNewsRequest};
