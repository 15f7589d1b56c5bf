//! Resolvers - trigger への並列問い合わせで決まる値
//!
//! - **SchedulerResolver**: app / global の 2 並列、エラーは無視
//! - **ImageResolver**: 3 並列、最初のエラーで全体が失敗

pub mod image;
pub mod scheduler;

pub use self::image::ImageResolver;
pub use self::scheduler::SchedulerResolver;
