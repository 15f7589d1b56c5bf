//! ImageResolver - デプロイ済みイメージの参照を組み立てる
//!
//! 3 つの問い合わせ（remote prefix, tag, repository）を同時に走らせる。
//! どれか 1 つでも失敗すれば全体が失敗し、部分的な参照は返さない。
//! 他の問い合わせの子プロセスは止めない（結果を捨てるだけ）。

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::domain::{AppName, BerthError, DEFAULT_TAG, ImageReference, default_repository};
use crate::ports::ContainerRuntime;

pub const DEPLOYED_APP_REPOSITORY: &str = "deployed-app-repository";
pub const DEPLOYED_APP_IMAGE_TAG: &str = "deployed-app-image-tag";
pub const DEPLOYED_APP_IMAGE_REPO: &str = "deployed-app-image-repo";

#[derive(Clone)]
pub struct ImageResolver {
    dispatcher: Dispatcher,
    runtime: Arc<dyn ContainerRuntime>,
}

impl ImageResolver {
    pub fn new(dispatcher: Dispatcher, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            dispatcher,
            runtime,
        }
    }

    /// Resolve the image of the app's current deployment.
    ///
    /// Precedence for each part: trigger answer, then the caller's fallback,
    /// then the default convention. The result must name an existing image.
    pub async fn resolve_deploy_image(
        &self,
        app: &AppName,
        fallback_tag: &str,
        fallback_repo: &str,
    ) -> Result<ImageReference, BerthError> {
        let target = app.as_str();
        let (remote, tag, repo) = tokio::try_join!(
            self.dispatcher.capture_text(DEPLOYED_APP_REPOSITORY, [target]),
            self.dispatcher.capture_text(DEPLOYED_APP_IMAGE_TAG, [target]),
            self.dispatcher.capture_text(DEPLOYED_APP_IMAGE_REPO, [target]),
        )?;

        let repository = first_non_empty([repo.as_str(), fallback_repo])
            .map(str::to_string)
            .unwrap_or_else(|| default_repository(app));
        let tag = first_non_empty([tag.as_str(), fallback_tag]).unwrap_or(DEFAULT_TAG);

        let image = ImageReference::new(repository, tag).with_remote(remote);
        self.verify(&image).await?;
        tracing::debug!(app = %app, %image, "resolved deploy image");
        Ok(image)
    }

    /// Tag of the running deployment.
    ///
    /// A failing trigger is returned as an error; callers that only need a
    /// best-effort answer fall back themselves.
    pub async fn running_image_tag(
        &self,
        app: &AppName,
        fallback_tag: &str,
    ) -> Result<String, BerthError> {
        let tag = self
            .dispatcher
            .capture_text(DEPLOYED_APP_IMAGE_TAG, [app.as_str()])
            .await?;
        Ok(first_non_empty([tag.as_str(), fallback_tag])
            .unwrap_or(DEFAULT_TAG)
            .to_string())
    }

    /// Image name for an app without consulting deployment triggers.
    ///
    /// An empty tag means `latest` and is not checked; an explicit tag must
    /// exist.
    pub async fn app_image_name(
        &self,
        app: &AppName,
        tag: &str,
        repo: &str,
    ) -> Result<ImageReference, BerthError> {
        let repository = if repo.is_empty() {
            default_repository(app)
        } else {
            repo.to_string()
        };
        if tag.is_empty() {
            return Ok(ImageReference::new(repository, DEFAULT_TAG));
        }
        let image = ImageReference::new(repository, tag);
        self.verify(&image).await?;
        Ok(image)
    }

    async fn verify(&self, image: &ImageReference) -> Result<(), BerthError> {
        let reference = image.to_string();
        if self.runtime.image_exists(&reference).await? {
            return Ok(());
        }
        Err(BerthError::ImageNotFound(reference))
    }
}

fn first_non_empty<const N: usize>(candidates: [&str; N]) -> Option<&str> {
    candidates.into_iter().find(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::console::Console;
    use crate::domain::TriggerOutput;
    use crate::impls::{CollectingSink, InMemoryRuntime, TriggerRegistry};

    fn resolver(registry: TriggerRegistry, runtime: InMemoryRuntime) -> ImageResolver {
        let console = Console::new(Arc::new(CollectingSink::new()), false);
        let dispatcher = Dispatcher::new(Arc::new(registry), console, false);
        ImageResolver::new(dispatcher, Arc::new(runtime))
    }

    fn web() -> AppName {
        AppName::parse("web").unwrap()
    }

    #[tokio::test]
    async fn trigger_answers_take_precedence() {
        let mut registry = TriggerRegistry::new();
        registry.register_fn(DEPLOYED_APP_REPOSITORY, |_: &[String]| {
            TriggerOutput::success("registry.example.com/\n")
        });
        registry.register_fn(DEPLOYED_APP_IMAGE_TAG, |_: &[String]| TriggerOutput::success("v7\n"));
        registry.register_fn(DEPLOYED_APP_IMAGE_REPO, |_: &[String]| {
            TriggerOutput::success("team/web\n")
        });
        let runtime = InMemoryRuntime::new().with_image("registry.example.com/team/web:v7");

        let image = resolver(registry, runtime)
            .resolve_deploy_image(&web(), "v1", "fallback/web")
            .await
            .unwrap();
        assert_eq!(image.to_string(), "registry.example.com/team/web:v7");
    }

    #[tokio::test]
    async fn empty_answers_fall_back_to_caller_then_defaults() {
        let runtime = InMemoryRuntime::new()
            .with_image("berth/web:v1")
            .with_image("berth/web:latest");
        let resolver = resolver(TriggerRegistry::new(), runtime);

        let with_tag = resolver.resolve_deploy_image(&web(), "v1", "").await.unwrap();
        assert_eq!(with_tag.to_string(), "berth/web:v1");

        let defaults = resolver.resolve_deploy_image(&web(), "", "").await.unwrap();
        assert_eq!(defaults.to_string(), "berth/web:latest");
    }

    #[tokio::test]
    async fn any_failing_query_fails_the_whole_resolution() {
        let mut registry = TriggerRegistry::new();
        registry.register_fn(DEPLOYED_APP_IMAGE_TAG, |_: &[String]| TriggerOutput::success("v7"));
        registry.register_fn(DEPLOYED_APP_IMAGE_REPO, |_: &[String]| {
            TriggerOutput::failure(1, "repo lookup failed\n")
        });
        let runtime = InMemoryRuntime::new().with_image("berth/web:v7");

        let err = resolver(registry, runtime)
            .resolve_deploy_image(&web(), "", "")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "repo lookup failed");
    }

    #[tokio::test]
    async fn missing_image_names_the_computed_reference() {
        let resolver = resolver(TriggerRegistry::new(), InMemoryRuntime::new());
        let err = resolver
            .resolve_deploy_image(&web(), "v2", "")
            .await
            .unwrap_err();
        assert!(matches!(err, BerthError::ImageNotFound(ref r) if r == "berth/web:v2"));
        assert_eq!(err.to_string(), "App image (berth/web:v2) not found");
    }

    #[tokio::test]
    async fn running_tag_uses_trigger_then_fallback() {
        let mut registry = TriggerRegistry::new();
        registry.register_fn(DEPLOYED_APP_IMAGE_TAG, |_: &[String]| TriggerOutput::success(""));
        let resolver = resolver(registry, InMemoryRuntime::new());

        assert_eq!(resolver.running_image_tag(&web(), "v3").await.unwrap(), "v3");
        assert_eq!(resolver.running_image_tag(&web(), "").await.unwrap(), "latest");
    }

    #[tokio::test]
    async fn app_image_name_checks_only_explicit_tags() {
        let resolver = resolver(TriggerRegistry::new(), InMemoryRuntime::new());

        let latest = resolver.app_image_name(&web(), "", "").await.unwrap();
        assert_eq!(latest.to_string(), "berth/web:latest");

        let err = resolver.app_image_name(&web(), "v9", "").await.unwrap_err();
        assert_eq!(err.to_string(), "App image (berth/web:v9) not found");
    }
}
