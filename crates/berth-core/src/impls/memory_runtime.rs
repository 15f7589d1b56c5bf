//! InMemoryRuntime - テスト用の ContainerRuntime

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{AppName, BerthError};
use crate::ports::ContainerRuntime;

#[derive(Default)]
pub struct InMemoryRuntime {
    images: HashSet<String>,
    running: HashSet<String>,
    cleanups: Mutex<Vec<Option<String>>>,
    image_removals: Mutex<Vec<String>>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.images.insert(image.into());
        self
    }

    pub fn with_running(mut self, container_id: impl Into<String>) -> Self {
        self.running.insert(container_id.into());
        self
    }

    /// Apps passed to `cleanup`, in call order (`None` for a global pass).
    pub fn cleanups(&self) -> Vec<Option<String>> {
        self.cleanup_log().clone()
    }

    /// Apps passed to `remove_app_images`, in call order.
    pub fn image_removals(&self) -> Vec<String> {
        self.image_removals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn cleanup_log(&self) -> MutexGuard<'_, Vec<Option<String>>> {
        self.cleanups.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn image_exists(&self, image: &str) -> Result<bool, BerthError> {
        Ok(self.images.contains(image))
    }

    async fn container_is_running(&self, container_id: &str) -> Result<bool, BerthError> {
        Ok(self.running.contains(container_id))
    }

    async fn cleanup(&self, app: Option<&AppName>) -> Result<(), BerthError> {
        self.cleanup_log().push(app.map(|a| a.to_string()));
        Ok(())
    }

    async fn remove_app_images(&self, app: &AppName) -> Result<(), BerthError> {
        self.image_removals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(app.to_string());
        Ok(())
    }
}
