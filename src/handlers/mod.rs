pub mod adventures;
pub mod auth;
pub mod avatars;
pub mod classrooms;
pub mod ebooks;
pub mod explore_tab;
pub mod my_explorer_tab;
pub mod notifications;
pub mod profiles;
pub mod progress;
pub mod quiz_attempts;
pub mod quizzes;
pub mod redirects;
pub mod series;
pub mod stats;
pub mod tabs;
pub mod themes;
pub mod uploads;
pub mod users;
pub mod videos;
