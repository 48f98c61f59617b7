//! In-memory [`WorkoutStore`]. Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{workout_not_found, WorkoutStore};
use crate::error::Result;
use crate::models::{NewWorkout, Owner, Workout, WorkoutSession};

struct MemorySession {
    owner: Owner,
    title: String,
    workouts: Vec<Workout>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    // Sessions in creation order. Emptied sessions stay until deleted.
    sessions: Vec<MemorySession>,
}

impl MemoryState {
    fn position(&self, owner: Owner, title: &str) -> Option<usize> {
        self.sessions
            .iter()
            .position(|s| s.owner == owner && s.title == title)
    }
}

#[derive(Default)]
pub struct MemoryWorkoutStore {
    state: RwLock<MemoryState>,
}

impl MemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
    async fn add(&self, owner: Owner, new: NewWorkout) -> Result<Workout> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let workout = Workout {
            id: state.next_id,
            user_id: owner.user_id(),
            session_title: new.session_title,
            exercise: new.exercise,
            sets: new.sets,
            reps: new.reps,
            rest: new.rest,
            created_at: Utc::now(),
        };

        match state.position(owner, &workout.session_title) {
            Some(idx) => state.sessions[idx].workouts.push(workout.clone()),
            None => {
                debug!(title = %workout.session_title, "creating session");
                state.sessions.push(MemorySession {
                    owner,
                    title: workout.session_title.clone(),
                    workouts: vec![workout.clone()],
                });
            }
        }

        Ok(workout)
    }

    async fn list(&self, owner: Owner, session_title: &str) -> Result<Vec<Workout>> {
        let state = self.state.read().await;
        Ok(state
            .position(owner, session_title)
            .map(|idx| state.sessions[idx].workouts.clone())
            .unwrap_or_default())
    }

    async fn list_all(&self, owner: Owner) -> Result<Vec<Workout>> {
        let state = self.state.read().await;
        let mut workouts: Vec<Workout> = state
            .sessions
            .iter()
            .filter(|s| s.owner == owner)
            .flat_map(|s| s.workouts.iter().cloned())
            .collect();
        workouts.sort_by_key(|w| w.id);
        Ok(workouts)
    }

    async fn sessions(&self, owner: Owner) -> Result<Vec<WorkoutSession>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .iter()
            .filter(|s| s.owner == owner)
            .map(|s| WorkoutSession {
                title: s.title.clone(),
                workouts: s.workouts.clone(),
            })
            .collect())
    }

    async fn delete_session(&self, owner: Owner, session_title: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.position(owner, session_title) {
            Some(idx) => {
                state.sessions.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_record(
        &self,
        owner: Owner,
        session_title: &str,
        index: usize,
    ) -> Result<Workout> {
        let mut state = self.state.write().await;
        let idx = state
            .position(owner, session_title)
            .ok_or_else(workout_not_found)?;

        let workouts = &mut state.sessions[idx].workouts;
        if index >= workouts.len() {
            return Err(workout_not_found());
        }
        Ok(workouts.remove(index))
    }

    async fn delete_by_id(&self, owner: Owner, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        for session in state.sessions.iter_mut().filter(|s| s.owner == owner) {
            if let Some(pos) = session.workouts.iter().position(|w| w.id == id) {
                session.workouts.remove(pos);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
