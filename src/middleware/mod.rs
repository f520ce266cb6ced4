pub mod auth;
pub mod response;

pub use auth::{
    AdminOrEbookProcessor, AdminOrVideoProcessor, AdminUser, CurrentUser, EbookProcessorAuth,
    VideoProcessorAuth,
};
pub use response::{ApiResponse, ApiResult};
