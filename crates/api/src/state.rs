use std::sync::Arc;

use atrium_billing::{BillingProvider, EntitlementReconciler};
use atrium_db::{DbPool, EntitlementStore, NotificationStore, ScheduleStore};
use atrium_notifications::{DeadlineNotifier, NotificationSink};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, when the stores are backed by PostgreSQL. Used by the
    /// health check only.
    pub pool: Option<DbPool>,
    pub config: Arc<ServerConfig>,
    pub reconciler: Arc<EntitlementReconciler>,
    pub deadlines: Arc<DeadlineNotifier>,
    pub notifications: NotificationSink,
}

impl AppState {
    /// Wire the components around a single store and billing provider.
    ///
    /// The same provider instance backs every component that talks to the
    /// billing service.
    pub fn new<S>(config: ServerConfig, store: Arc<S>, provider: Arc<dyn BillingProvider>) -> Self
    where
        S: EntitlementStore + ScheduleStore + NotificationStore + 'static,
    {
        let sink = NotificationSink::new(store.clone());
        let zone = config.deadline_zone();

        let reconciler = EntitlementReconciler::new(store.clone(), sink.clone(), provider)
            .with_webhook_secret(config.billing.webhook_secret.clone())
            .with_tolerance_secs(config.billing.webhook_tolerance_secs)
            .with_zone(zone);

        let deadlines = DeadlineNotifier::new(store, sink.clone(), zone);

        Self {
            pool: None,
            config: Arc::new(config),
            reconciler: Arc::new(reconciler),
            deadlines: Arc::new(deadlines),
            notifications: sink,
        }
    }

    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
