pub mod from_row;
pub mod user;
pub mod workout;

pub use from_row::FromSqliteRow;
pub use user::{CreateUser, LoginCredentials, PublicUser, User};
pub use workout::{
    group_sessions, CreateWorkout, NewWorkout, Owner, SessionView, Workout, WorkoutEntry,
    WorkoutForm, WorkoutSession,
};
