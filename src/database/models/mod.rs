pub mod adventure;
pub mod avatar;
pub mod classroom;
pub mod ebook;
pub mod profile;
pub mod progress;
pub mod quiz;
pub mod series;
pub mod theme;
pub mod user;
pub mod video;

pub use adventure::Adventure;
pub use avatar::Avatar;
pub use classroom::Classroom;
pub use ebook::{Ebook, EbookPage};
pub use profile::Profile;
pub use progress::AdventureProgress;
pub use quiz::{AttemptStatus, Quiz, QuizAttempt, QuizQuestion, QuizResponse};
pub use series::Series;
pub use theme::Theme;
pub use user::User;
pub use video::{Video, VideoVariant};
