//! Domain model (app names, app views, triggers, images, errors).

pub mod app;
pub mod app_name;
pub mod errors;
pub mod image;
pub mod property;
pub mod scheduler;
pub mod trigger;

pub use self::app::App;
pub use self::app_name::{AppName, GLOBAL_APP};
pub use self::errors::BerthError;
pub use self::image::{DEFAULT_TAG, ImageReference, default_repository};
pub use self::scheduler::{DEFAULT_SCHEDULER, SchedulerName};
pub use self::trigger::{StreamMode, TriggerInvocation, TriggerOutput};
