//! Fan-out of one query across every backend a user owns.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use mg_backend::{ClientRegistry, Criteria};
use mg_core::config::{AggregationConfig, InstanceConfig};
use mg_core::{Error, InstanceId, InstanceKey, MediaItem, Result, UserId};

use super::catalog::Catalog;
use crate::instances::InstanceStore;

/// One backend that could not contribute to an aggregate query.
#[derive(Debug)]
pub struct InstanceFailure {
    pub key: InstanceKey,
    pub name: String,
    pub error: Error,
}

/// Merged result of an aggregate query plus what happened per instance.
#[derive(Debug, Default)]
pub struct Aggregated {
    /// Merged items, re-sorted and truncated per the criteria.
    pub items: Vec<MediaItem>,
    /// Instances that answered.
    pub queried: Vec<InstanceKey>,
    /// Instances whose client lacks the capability.
    pub skipped: Vec<InstanceKey>,
    /// Instances that failed to connect, errored, or timed out.
    pub failures: Vec<InstanceFailure>,
}

impl Aggregated {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum Outcome {
    Items(InstanceKey, Vec<MediaItem>),
    Skipped(InstanceKey),
    Failed(InstanceFailure),
}

/// Lists one media type across all of a user's backends.
///
/// Per-instance failures are logged and left out of the result; the call only
/// fails when the user has no instances, when every attempted instance
/// failed, or when `ctx` is cancelled.
pub struct AggregationService<C: Catalog> {
    registry: Arc<ClientRegistry>,
    store: Arc<dyn InstanceStore>,
    settings: AggregationConfig,
    _catalog: PhantomData<fn() -> C>,
}

impl<C: Catalog> AggregationService<C> {
    pub fn new(
        registry: Arc<ClientRegistry>,
        store: Arc<dyn InstanceStore>,
        settings: AggregationConfig,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
            _catalog: PhantomData,
        }
    }

    /// Query every capable backend of `user` and merge the results.
    ///
    /// Items keep their per-backend order until a sort is requested; the sort
    /// runs over the merged list and the limit applies after it. Duplicates
    /// across backends are kept.
    pub async fn list_by_criteria(
        &self,
        ctx: &CancellationToken,
        user: UserId,
        criteria: &Criteria,
    ) -> Result<Vec<MediaItem>> {
        self.list_with_report(ctx, user, criteria)
            .await
            .map(|report| report.items)
    }

    /// Like [`list_by_criteria`](Self::list_by_criteria), but also reports
    /// which instances answered, were skipped, or failed.
    pub async fn list_with_report(
        &self,
        ctx: &CancellationToken,
        user: UserId,
        criteria: &Criteria,
    ) -> Result<Aggregated> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let instances = self.store.instances_for_user(user).await?;
        if instances.is_empty() {
            return Err(Error::NoInstances(user));
        }

        let concurrency = self.settings.max_concurrency.max(1);
        let outcomes: Vec<Outcome> = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::debug!(user = %user, capability = %C::CAPABILITY, "Aggregate query cancelled");
                return Err(Error::Cancelled);
            }
            outcomes = stream::iter(&instances)
                .map(|instance| self.query_instance(ctx, instance, criteria))
                .buffered(concurrency)
                .collect::<Vec<_>>() => outcomes,
        };

        let mut report = Aggregated::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Items(key, items) => {
                    report.queried.push(key);
                    report.items.extend(items);
                }
                Outcome::Skipped(key) => report.skipped.push(key),
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }

        if report.queried.is_empty() {
            if let Some(last) = report.failures.last() {
                return Err(Error::AllBackendsFailed {
                    media_type: C::CAPABILITY.media_type(),
                    attempted: report.failures.len(),
                    last_error: last.error.to_string(),
                });
            }
        }

        criteria.apply(&mut report.items);

        tracing::debug!(
            user = %user,
            capability = %C::CAPABILITY,
            items = report.items.len(),
            queried = report.queried.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Aggregate query finished"
        );

        Ok(report)
    }

    /// Fetch one item from one named instance of `user`.
    ///
    /// Unlike listing, every error propagates. An instance without the
    /// capability yields [`Error::UnsupportedCapability`].
    pub async fn get_by_id(
        &self,
        ctx: &CancellationToken,
        user: UserId,
        instance_id: InstanceId,
        foreign_id: &str,
    ) -> Result<MediaItem> {
        let instance = self
            .store
            .instance_for_user(user, instance_id)
            .await?
            .ok_or_else(|| Error::not_found("instance", instance_id))?;
        let key = instance.key();

        let client = self.registry.get_or_create(ctx, instance.id, &instance).await?;
        let call = C::get(client.as_ref(), ctx, foreign_id)
            .ok_or_else(|| Error::unsupported(key, C::CAPABILITY))?;

        let operation = format!("get {}", C::CAPABILITY.media_type());
        let mut item = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(Error::Cancelled),
            r = self.bounded(key, &operation, call) => r?,
        };
        item.origin = Some(key);
        Ok(item)
    }

    async fn query_instance(
        &self,
        ctx: &CancellationToken,
        instance: &InstanceConfig,
        criteria: &Criteria,
    ) -> Outcome {
        let key = instance.key();

        let client = match self.registry.get_or_create(ctx, instance.id, instance).await {
            Ok(client) => client,
            Err(e) => return failed(instance, "connect", e),
        };

        let Some(call) = C::list(client.as_ref(), ctx, criteria) else {
            tracing::debug!(
                instance = %key,
                capability = %C::CAPABILITY,
                "Backend lacks capability; skipping"
            );
            return Outcome::Skipped(key);
        };

        let operation = format!("list {}", C::CAPABILITY);
        match self.bounded(key, &operation, call).await {
            Ok(mut items) => {
                for item in &mut items {
                    item.origin = Some(key);
                }
                Outcome::Items(key, items)
            }
            Err(e) => failed(instance, &operation, e),
        }
    }

    /// Apply the per-instance deadline, if one is configured, and name the
    /// instance and operation on whatever the client returns.
    async fn bounded<T>(
        &self,
        key: InstanceKey,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let result = match self.settings.query_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::timeout(key, operation))?,
            None => call.await,
        };
        result.map_err(|e| e.with_context(key, operation))
    }
}

fn failed(instance: &InstanceConfig, operation: &str, error: Error) -> Outcome {
    let key = instance.key();
    tracing::warn!(
        instance = %key,
        name = %instance.name,
        operation,
        error = %error,
        "Backend query failed; leaving it out of the result"
    );
    Outcome::Failed(InstanceFailure {
        key,
        name: instance.name.clone(),
        error,
    })
}

impl<C: Catalog> Clone for AggregationService<C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
            settings: self.settings.clone(),
            _catalog: PhantomData,
        }
    }
}

impl<C: Catalog> fmt::Debug for AggregationService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationService")
            .field("capability", &C::CAPABILITY)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
