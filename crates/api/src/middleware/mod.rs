//! Request middleware.

pub mod track_activity;

pub use track_activity::track_user_activity;
