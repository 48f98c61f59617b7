use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FromSqliteRow;
use crate::error::{AppError, Result};

/// Who a workout belongs to. The form flow records workouts for the
/// anonymous guest; the JSON API records them for the authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Owner(Option<i64>);

impl Owner {
    pub const GUEST: Owner = Owner(None);

    pub fn user(id: i64) -> Self {
        Owner(Some(id))
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_title: String,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub rest: u32,
    #[serde(skip_serializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Workout {
    pub fn owner(&self) -> Owner {
        Owner(self.user_id)
    }
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            session_title: row.get("session_title")?,
            exercise: row.get("exercise")?,
            sets: row.get("sets")?,
            reps: row.get("reps")?,
            rest: row.get("rest")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// A validated workout waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub session_title: String,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub rest: u32,
}

impl NewWorkout {
    pub fn new(session_title: &str, exercise: &str, sets: u32, reps: u32, rest: u32) -> Result<Self> {
        let session_title = session_title.trim();
        if session_title.is_empty() {
            return Err(AppError::Validation("Session title is required".to_string()));
        }
        let exercise = exercise.trim();
        if exercise.is_empty() {
            return Err(AppError::Validation("Exercise is required".to_string()));
        }

        Ok(Self {
            session_title: session_title.to_string(),
            exercise: exercise.to_string(),
            sets,
            reps,
            rest,
        })
    }

    /// Parse raw form values. Counts must be non-negative integers.
    pub fn parse(
        session_title: &str,
        exercise: &str,
        sets: &str,
        reps: &str,
        rest: &str,
    ) -> Result<Self> {
        let sets = parse_count("sets", sets)?;
        let reps = parse_count("reps", reps)?;
        let rest = parse_count("rest", rest)?;
        Self::new(session_title, exercise, sets, reps, rest)
    }
}

fn parse_count(field: &str, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        AppError::Validation(format!("{} must be a non-negative integer", field))
    })
}

/// Fields posted by the workout form.
#[derive(Debug, Default, Deserialize)]
pub struct WorkoutForm {
    #[serde(default)]
    pub session_title: String,
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub sets: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub rest: String,
}

impl WorkoutForm {
    pub fn validate(&self) -> Result<NewWorkout> {
        NewWorkout::parse(
            &self.session_title,
            &self.exercise,
            &self.sets,
            &self.reps,
            &self.rest,
        )
    }
}

/// JSON body for `POST /api/workouts`. Counts may arrive as numbers or
/// numeric strings.
#[derive(Debug, Default, Deserialize)]
pub struct CreateWorkout {
    #[serde(default)]
    pub session_title: String,
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub sets: Value,
    #[serde(default)]
    pub reps: Value,
    #[serde(default)]
    pub rest: Value,
}

impl CreateWorkout {
    pub fn validate(&self) -> Result<NewWorkout> {
        NewWorkout::parse(
            &self.session_title,
            &self.exercise,
            &value_text(&self.sets),
            &value_text(&self.reps),
            &value_text(&self.rest),
        )
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// The form-flow view of a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkoutEntry {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub rest: u32,
}

impl From<&Workout> for WorkoutEntry {
    fn from(workout: &Workout) -> Self {
        Self {
            exercise: workout.exercise.clone(),
            sets: workout.sets,
            reps: workout.reps,
            rest: workout.rest,
        }
    }
}

/// A named, ordered group of workouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSession {
    pub title: String,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub title: String,
    pub workouts: Vec<WorkoutEntry>,
}

impl From<&WorkoutSession> for SessionView {
    fn from(session: &WorkoutSession) -> Self {
        Self {
            title: session.title.clone(),
            workouts: session.workouts.iter().map(WorkoutEntry::from).collect(),
        }
    }
}

/// Group workouts by title, keeping the order in which each title first
/// appears and the order of workouts within a title.
pub fn group_sessions(workouts: Vec<Workout>) -> Vec<WorkoutSession> {
    let mut sessions: Vec<WorkoutSession> = Vec::new();
    for workout in workouts {
        match sessions
            .iter_mut()
            .find(|s| s.title == workout.session_title)
        {
            Some(session) => session.workouts.push(workout),
            None => sessions.push(WorkoutSession {
                title: workout.session_title.clone(),
                workouts: vec![workout],
            }),
        }
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(id: i64, title: &str, exercise: &str) -> Workout {
        Workout {
            id,
            user_id: None,
            session_title: title.to_string(),
            exercise: exercise.to_string(),
            sets: 3,
            reps: 10,
            rest: 60,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_trims_title() {
        let new = NewWorkout::parse("  Leg Day ", "Squat", "3", "10", "60").unwrap();
        assert_eq!(new.session_title, "Leg Day");
        assert_eq!((new.sets, new.reps, new.rest), (3, 10, 60));
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage_counts() {
        for (sets, reps, rest) in [("-1", "10", "60"), ("3", "ten", "60"), ("3", "10", "1.5"), ("", "10", "60")] {
            let result = NewWorkout::parse("Leg Day", "Squat", sets, reps, rest);
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "expected validation error for {sets}/{reps}/{rest}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_blank_title_and_exercise() {
        assert!(matches!(
            NewWorkout::parse("   ", "Squat", "3", "10", "60"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            NewWorkout::parse("Leg Day", "", "3", "10", "60"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_workout_accepts_numbers_and_strings() {
        let body: CreateWorkout = serde_json::from_str(
            r#"{"session_title":"Leg Day","exercise":"Squat","sets":3,"reps":"10","rest":60}"#,
        )
        .unwrap();
        let new = body.validate().unwrap();
        assert_eq!((new.sets, new.reps, new.rest), (3, 10, 60));
    }

    #[test]
    fn test_create_workout_missing_field_is_validation_error() {
        let body: CreateWorkout =
            serde_json::from_str(r#"{"session_title":"Leg Day","exercise":"Squat","sets":3}"#)
                .unwrap();
        assert!(matches!(body.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_workout_serializes_api_fields_only() {
        let json = serde_json::to_value(workout(7, "Leg Day", "Squat")).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["exercise", "id", "reps", "rest", "session_title", "sets", "user_id"]
        );
    }

    #[test]
    fn test_group_sessions_keeps_first_seen_order() {
        let sessions = group_sessions(vec![
            workout(1, "Leg Day", "Squat"),
            workout(2, "Push", "Bench"),
            workout(3, "Leg Day", "Lunge"),
        ]);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].title, "Leg Day");
        assert_eq!(
            sessions[0]
                .workouts
                .iter()
                .map(|w| w.exercise.as_str())
                .collect::<Vec<_>>(),
            ["Squat", "Lunge"]
        );
        assert_eq!(sessions[1].title, "Push");
    }

    #[test]
    fn test_owner() {
        assert_eq!(Owner::GUEST.user_id(), None);
        assert_eq!(Owner::user(4).user_id(), Some(4));
        assert_eq!(workout(1, "a", "b").owner(), Owner::GUEST);
    }
}
