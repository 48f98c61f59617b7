pub mod token_repo;
pub mod user_repo;
pub mod workout_repo;

pub use token_repo::RevokedTokenRepository;
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;
