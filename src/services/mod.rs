pub mod auth;
pub mod database;
pub mod gallery;
pub mod luminance;
pub mod thumbnail;
pub mod users;
pub mod utils;

// 重新导出常用类型
pub use gallery::GalleryService;
pub use users::UserService;
