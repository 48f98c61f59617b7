//! SQLite-backed [`WorkoutStore`].

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{group_sessions, FromSqliteRow, NewWorkout, Owner, Workout, WorkoutSession};
use crate::store::{workout_not_found, WorkoutStore};

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkoutStore for WorkoutRepository {
    async fn add(&self, owner: Owner, new: NewWorkout) -> Result<Workout> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let now = Utc::now();
            conn.execute(
                "INSERT INTO workouts (user_id, session_title, exercise, sets, reps, rest, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    owner.user_id(),
                    new.session_title,
                    new.exercise,
                    new.sets,
                    new.reps,
                    new.rest,
                    now
                ],
            )?;

            Ok(Workout {
                id: conn.last_insert_rowid(),
                user_id: owner.user_id(),
                session_title: new.session_title,
                exercise: new.exercise,
                sets: new.sets,
                reps: new.reps,
                rest: new.rest,
                created_at: now,
            })
        })
        .await?
    }

    async fn list(&self, owner: Owner, session_title: &str) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        let session_title = session_title.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workouts WHERE session_title = ? AND user_id IS ? ORDER BY id",
            )?;
            let workouts = stmt
                .query_map(
                    rusqlite::params![session_title, owner.user_id()],
                    Workout::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await?
    }

    async fn list_all(&self, owner: Owner) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workouts WHERE user_id IS ? ORDER BY id")?;
            let workouts = stmt
                .query_map([owner.user_id()], Workout::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await?
    }

    async fn sessions(&self, owner: Owner) -> Result<Vec<WorkoutSession>> {
        Ok(group_sessions(self.list_all(owner).await?))
    }

    async fn delete_session(&self, owner: Owner, session_title: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let session_title = session_title.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workouts WHERE session_title = ? AND user_id IS ?",
                rusqlite::params![session_title, owner.user_id()],
            )?;
            Ok(rows > 0)
        })
        .await?
    }

    async fn delete_record(
        &self,
        owner: Owner,
        session_title: &str,
        index: usize,
    ) -> Result<Workout> {
        let pool = self.pool.clone();
        let session_title = session_title.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let offset = i64::try_from(index).map_err(|_| workout_not_found())?;
            let workout = tx
                .query_row(
                    "SELECT * FROM workouts WHERE session_title = ? AND user_id IS ?
                     ORDER BY id LIMIT 1 OFFSET ?",
                    rusqlite::params![session_title, owner.user_id(), offset],
                    Workout::from_row,
                )
                .optional()?
                .ok_or_else(workout_not_found)?;

            tx.execute("DELETE FROM workouts WHERE id = ?", [workout.id])?;
            tx.commit()?;
            Ok(workout)
        })
        .await?
    }

    async fn delete_by_id(&self, owner: Owner, id: i64) -> Result<bool> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workouts WHERE id = ? AND user_id IS ?",
                rusqlite::params![id, owner.user_id()],
            )?;
            Ok(rows > 0)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;
    use crate::store::contract;

    fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    fn create_test_user(pool: &DbPool, username: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, datetime('now'))",
            rusqlite::params![username, format!("{}@example.com", username), "hash"],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_add_then_list_preserves_order() {
        let repo = WorkoutRepository::new(setup_test_db());
        contract::add_then_list_preserves_order(&repo, Owner::GUEST).await;
    }

    #[tokio::test]
    async fn test_list_unknown_session_is_empty() {
        let repo = WorkoutRepository::new(setup_test_db());
        contract::list_unknown_session_is_empty(&repo, Owner::GUEST).await;
    }

    #[tokio::test]
    async fn test_title_is_trimmed() {
        let repo = WorkoutRepository::new(setup_test_db());
        contract::title_is_trimmed(&repo, Owner::GUEST).await;
    }

    #[tokio::test]
    async fn test_delete_session_then_list_is_empty() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);
        contract::delete_session_then_list_is_empty(&repo, Owner::user(user_id)).await;
    }

    #[tokio::test]
    async fn test_delete_record_shifts_indices() {
        let repo = WorkoutRepository::new(setup_test_db());
        contract::delete_record_shifts_indices(&repo, Owner::GUEST).await;
    }

    #[tokio::test]
    async fn test_delete_record_out_of_bounds() {
        let repo = WorkoutRepository::new(setup_test_db());
        contract::delete_record_out_of_bounds(&repo, Owner::GUEST).await;
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let bob = create_test_user(&pool, "bob");
        let repo = WorkoutRepository::new(pool);
        contract::owners_are_isolated(&repo, Owner::user(alice), Owner::user(bob)).await;
    }

    #[tokio::test]
    async fn test_guest_and_user_are_isolated() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);
        contract::owners_are_isolated(&repo, Owner::GUEST, Owner::user(alice)).await;
    }

    #[tokio::test]
    async fn test_sessions_and_list_all() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);
        contract::sessions_and_list_all(&repo, Owner::user(user_id)).await;
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_workouts() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool.clone());
        let new = NewWorkout::new("Leg Day", "Squat", 3, 10, 60).unwrap();
        repo.add(Owner::user(user_id), new).await.unwrap();

        pool.get()
            .unwrap()
            .execute("DELETE FROM users WHERE id = ?", [user_id])
            .unwrap();

        assert!(repo.list_all(Owner::user(user_id)).await.unwrap().is_empty());
    }
}
