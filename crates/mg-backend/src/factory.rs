//! Construction of live clients.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mg_core::config::InstanceConfig;
use mg_core::{InstanceId, Result};

use crate::capability::BackendClient;

/// Builds a live [`BackendClient`] for one configured instance.
///
/// One factory is registered per [`BackendKind`](mg_core::BackendKind). A
/// factory may perform I/O (authentication, version probing) and should
/// give up early when `ctx` is cancelled.
///
/// Any `async` closure with the right shape is a factory:
///
/// ```rust,ignore
/// registry.register_factory(BackendKind::Radarr, |_ctx, id, config: InstanceConfig| async move {
///     Ok(Arc::new(RadarrClient::connect(id, &config).await?) as Arc<dyn BackendClient>)
/// });
/// ```
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(
        &self,
        ctx: &CancellationToken,
        instance_id: InstanceId,
        config: &InstanceConfig,
    ) -> Result<Arc<dyn BackendClient>>;
}

#[async_trait]
impl<F, Fut> ClientFactory for F
where
    F: Fn(CancellationToken, InstanceId, InstanceConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn BackendClient>>> + Send,
{
    async fn create(
        &self,
        ctx: &CancellationToken,
        instance_id: InstanceId,
        config: &InstanceConfig,
    ) -> Result<Arc<dyn BackendClient>> {
        (self)(ctx.clone(), instance_id, config.clone()).await
    }
}
