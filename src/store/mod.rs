//! Workout session storage.
//!
//! [`WorkoutStore`] is the one contract both backends implement: the
//! in-memory [`MemoryWorkoutStore`] and the SQLite-backed
//! [`WorkoutRepository`](crate::repositories::WorkoutRepository). Every
//! operation is scoped by an [`Owner`], so a guest's "Leg Day" and a user's
//! "Leg Day" never mix.

pub mod memory;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{NewWorkout, Owner, Workout, WorkoutSession};

pub use memory::MemoryWorkoutStore;

#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Append a workout to the end of its session, creating the session.
    async fn add(&self, owner: Owner, workout: NewWorkout) -> Result<Workout>;

    /// Workouts of one session in insertion order. Unknown sessions are empty.
    async fn list(&self, owner: Owner, session_title: &str) -> Result<Vec<Workout>>;

    /// Every workout of the owner in insertion order.
    async fn list_all(&self, owner: Owner) -> Result<Vec<Workout>>;

    /// The owner's sessions, each with its workouts.
    async fn sessions(&self, owner: Owner) -> Result<Vec<WorkoutSession>>;

    /// Remove a session and all its workouts. Returns `false` if absent.
    async fn delete_session(&self, owner: Owner, session_title: &str) -> Result<bool>;

    /// Remove the workout at `index`; later workouts shift down by one.
    async fn delete_record(&self, owner: Owner, session_title: &str, index: usize)
        -> Result<Workout>;

    /// Remove one of the owner's workouts by id. Returns `false` if absent.
    async fn delete_by_id(&self, owner: Owner, id: i64) -> Result<bool>;
}

pub(crate) fn workout_not_found() -> AppError {
    AppError::NotFound("Exercise could not be found".to_string())
}
