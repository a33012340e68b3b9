//! Entitlement reconciliation against the billing provider.
//!
//! Two paths update a user's tier:
//!
//! - **Push**: the provider posts a signed event. Verified events assign the
//!   target tier directly, so duplicates and retries are harmless.
//! - **Pull**: the user returns from checkout before the event arrives. The
//!   provider is asked for an active subscription and, if the user is not
//!   yet paid, the same upgrade is applied and a welcome notification sent.
//!
//! Both paths write `tier = paid` as a plain assignment, so whichever lands
//! second is a no-op. The pull path never demotes.

use std::sync::Arc;

use atrium_core::deadlines::ReferenceZone;
use atrium_core::entitlement::{tier_evidence, Tier};
use atrium_core::error::CoreError;
use atrium_core::notification::{
    dedupe_key, NotificationKind, BILLING_LINK, WELCOME_MESSAGE, WELCOME_TITLE,
};
use atrium_core::signing::{verify_signature, DEFAULT_TOLERANCE_SECS};
use atrium_core::types::{DbId, Timestamp};
use atrium_db::models::entitlement::Entitlement;
use atrium_db::models::notification::NewNotification;
use atrium_db::{EntitlementStore, StoreError};
use atrium_notifications::NotificationSink;
use chrono::Utc;
use serde::Serialize;

use crate::error::BillingError;
use crate::event::BillingEvent;
use crate::provider::BillingProvider;

/// Result of a verified push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Upgraded { user_id: DbId },
    Downgraded { user_id: DbId },
    /// The subscription status is neither active nor terminal.
    NoEvidence { status: String },
    /// No user could be resolved from the event. Logged, not retried.
    Unresolved,
    Ignored { event_type: String },
}

/// Result of a pull-path sync. The pull path never fails its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullOutcome {
    /// The user has never started a checkout.
    NoCustomer,
    NoActiveSubscription,
    /// An active subscription exists and the tier already reflects it.
    AlreadyPaid,
    Upgraded,
    /// The provider or the datastore failed; nothing changed.
    Failed,
}

pub struct EntitlementReconciler {
    entitlements: Arc<dyn EntitlementStore>,
    sink: NotificationSink,
    provider: Arc<dyn BillingProvider>,
    webhook_secret: Option<String>,
    tolerance_secs: i64,
    zone: ReferenceZone,
}

impl EntitlementReconciler {
    pub fn new(
        entitlements: Arc<dyn EntitlementStore>,
        sink: NotificationSink,
        provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            entitlements,
            sink,
            provider,
            webhook_secret: None,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            zone: ReferenceZone::utc(),
        }
    }

    /// Secret used to verify push events. Without one every push is rejected.
    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty());
        self
    }

    /// Maximum age of a signed push event, in seconds.
    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Zone whose calendar day scopes the welcome notification.
    pub fn with_zone(mut self, zone: ReferenceZone) -> Self {
        self.zone = zone;
        self
    }

    /// Current entitlement, created as `free` on first read.
    pub async fn entitlement(&self, user_id: DbId) -> Result<Entitlement, StoreError> {
        self.entitlements.get_or_create(user_id).await
    }

    // -- Push path -----------------------------------------------------------

    pub async fn handle_push(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PushOutcome, BillingError> {
        self.handle_push_at(payload, signature_header, Utc::now()).await
    }

    /// Verify and apply a provider event received at `now`.
    ///
    /// Authentication failures and datastore failures are errors; the
    /// provider retries on any non-2xx answer. Events that verify but name
    /// no resolvable user are logged and acknowledged.
    pub async fn handle_push_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: Timestamp,
    ) -> Result<PushOutcome, BillingError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(BillingError::WebhookSecretMissing)?;
        let header = signature_header.ok_or(BillingError::SignatureHeaderMissing)?;
        verify_signature(secret, header, payload, now.timestamp(), self.tolerance_secs)?;

        let (event_type, event) = BillingEvent::parse(payload)?;

        match event {
            BillingEvent::CheckoutCompleted {
                user_id,
                customer_ref,
            } => {
                let Some(user_id) = user_id else {
                    tracing::error!(
                        event_type = %event_type,
                        customer_ref = ?customer_ref,
                        "Verified checkout event has no user id",
                    );
                    return Ok(PushOutcome::Unresolved);
                };
                self.assign(user_id, Tier::Paid, customer_ref.as_deref())
                    .await?;
                Ok(PushOutcome::Upgraded { user_id })
            }

            BillingEvent::SubscriptionChanged {
                user_id,
                customer_ref,
                status,
            } => {
                let Some(tier) = tier_evidence(&status) else {
                    tracing::info!(
                        event_type = %event_type,
                        customer_ref = ?customer_ref,
                        status = %status,
                        "Subscription status carries no tier change",
                    );
                    return Ok(PushOutcome::NoEvidence { status });
                };
                self.apply_resolved(&event_type, user_id, customer_ref, tier)
                    .await
            }

            BillingEvent::SubscriptionDeleted {
                user_id,
                customer_ref,
            } => {
                self.apply_resolved(&event_type, user_id, customer_ref, Tier::Free)
                    .await
            }

            BillingEvent::Ignored { event_type } => {
                tracing::debug!(event_type = %event_type, "Ignoring billing event");
                Ok(PushOutcome::Ignored { event_type })
            }
        }
    }

    async fn apply_resolved(
        &self,
        event_type: &str,
        user_id: Option<DbId>,
        customer_ref: Option<String>,
        tier: Tier,
    ) -> Result<PushOutcome, BillingError> {
        let Some(user_id) = self.resolve_user(user_id, customer_ref.as_deref()).await? else {
            tracing::error!(
                event_type,
                customer_ref = ?customer_ref,
                "Verified subscription event matches no user",
            );
            return Ok(PushOutcome::Unresolved);
        };

        self.assign(user_id, tier, customer_ref.as_deref()).await?;
        Ok(match tier {
            Tier::Paid => PushOutcome::Upgraded { user_id },
            Tier::Free => PushOutcome::Downgraded { user_id },
        })
    }

    async fn resolve_user(
        &self,
        user_id: Option<DbId>,
        customer_ref: Option<&str>,
    ) -> Result<Option<DbId>, StoreError> {
        if user_id.is_some() {
            return Ok(user_id);
        }
        let Some(customer_ref) = customer_ref else {
            return Ok(None);
        };
        Ok(self
            .entitlements
            .find_by_customer_ref(customer_ref)
            .await?
            .map(|e| e.user_id))
    }

    /// Target-state write shared by both paths.
    async fn assign(
        &self,
        user_id: DbId,
        tier: Tier,
        customer_ref: Option<&str>,
    ) -> Result<Entitlement, StoreError> {
        let entitlement = self
            .entitlements
            .set_tier(user_id, tier, customer_ref)
            .await?;
        tracing::info!(
            user_id,
            tier = %tier,
            customer_ref = ?entitlement.billing_customer_ref,
            "Entitlement tier assigned",
        );
        Ok(entitlement)
    }

    // -- Pull path -----------------------------------------------------------

    /// Reconcile on return from checkout.
    ///
    /// Upgrades only when the provider reports an active subscription and
    /// the stored tier is not already paid; in that case one welcome
    /// notification is written. Every failure is logged and reported as
    /// [`PullOutcome::Failed`].
    pub async fn sync_on_return(&self, user_id: DbId) -> PullOutcome {
        self.sync_on_return_at(user_id, Utc::now()).await
    }

    /// [`sync_on_return`](Self::sync_on_return) evaluated at `now`.
    pub async fn sync_on_return_at(&self, user_id: DbId, now: Timestamp) -> PullOutcome {
        let entitlement = match self.entitlements.get_or_create(user_id).await {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to read entitlement on return");
                return PullOutcome::Failed;
            }
        };

        let Some(customer_ref) = entitlement.billing_customer_ref.as_deref() else {
            return PullOutcome::NoCustomer;
        };

        let subscriptions = match self.provider.list_active_subscriptions(customer_ref, 1).await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    customer_ref,
                    error = %e,
                    "Billing provider query failed on return",
                );
                return PullOutcome::Failed;
            }
        };

        if !subscriptions.iter().any(|s| s.is_active()) {
            return PullOutcome::NoActiveSubscription;
        }
        if entitlement.is_paid() {
            return PullOutcome::AlreadyPaid;
        }

        if let Err(e) = self.assign(user_id, Tier::Paid, Some(customer_ref)).await {
            tracing::error!(user_id, customer_ref, error = %e, "Failed to upgrade on return");
            return PullOutcome::Failed;
        }

        let welcome = NewNotification {
            user_id,
            kind: NotificationKind::Success,
            title: WELCOME_TITLE.to_string(),
            message: WELCOME_MESSAGE.to_string(),
            link: Some(BILLING_LINK.to_string()),
            dedupe_key: Some(dedupe_key(WELCOME_TITLE, BILLING_LINK, self.zone.today(now))),
        };
        if let Err(e) = self.sink.notify(welcome).await {
            tracing::error!(user_id, error = %e, "Failed to write welcome notification");
        }

        PullOutcome::Upgraded
    }

    // -- Hosted sessions -----------------------------------------------------

    /// Start a subscription checkout and return the hosted page URL.
    ///
    /// Creates and records a provider customer on first use. The tier is not
    /// touched; it changes once the provider confirms payment.
    pub async fn start_checkout(
        &self,
        user_id: DbId,
        email: Option<&str>,
    ) -> Result<String, BillingError> {
        let entitlement = self.entitlements.get_or_create(user_id).await?;
        if entitlement.is_paid() {
            return Err(CoreError::Conflict("Subscription is already active".into()).into());
        }

        let customer_ref = match entitlement.billing_customer_ref {
            Some(existing) => existing,
            None => {
                let created = self.provider.create_customer(user_id, email).await?;
                self.entitlements.set_customer_ref(user_id, &created).await?;
                tracing::info!(user_id, customer_ref = %created, "Billing customer created");
                created
            }
        };

        Ok(self
            .provider
            .create_checkout_session(&customer_ref, user_id)
            .await?)
    }

    /// Open the hosted billing portal and return its URL.
    pub async fn open_portal(&self, user_id: DbId) -> Result<String, BillingError> {
        let entitlement = self.entitlements.get_or_create(user_id).await?;
        let customer_ref = entitlement.billing_customer_ref.ok_or_else(|| {
            CoreError::Validation("No billing account exists for this user".into())
        })?;
        Ok(self.provider.create_portal_session(&customer_ref).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use atrium_core::signing::{signature_header, SignatureError};
    use atrium_db::{MemoryStore, NotificationStore};
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::provider::{ProviderError, Subscription};

    const SECRET: &str = "whsec_test";

    #[derive(Default)]
    struct FakeProvider {
        subscriptions: Mutex<Vec<Subscription>>,
        fail: AtomicBool,
        queries: AtomicUsize,
        customers_created: AtomicUsize,
    }

    impl FakeProvider {
        fn with_active() -> Self {
            let provider = Self::default();
            provider.subscriptions.lock().unwrap().push(Subscription {
                id: "sub_1".into(),
                status: "active".into(),
                created: 1_700_000_000,
            });
            provider
        }

        fn check(&self) -> Result<(), ProviderError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::Api {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BillingProvider for FakeProvider {
        async fn list_active_subscriptions(
            &self,
            _customer_ref: &str,
            limit: u32,
        ) -> Result<Vec<Subscription>, ProviderError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            let subs = self.subscriptions.lock().unwrap();
            Ok(subs.iter().take(limit as usize).cloned().collect())
        }

        async fn create_customer(
            &self,
            user_id: DbId,
            _email: Option<&str>,
        ) -> Result<String, ProviderError> {
            self.check()?;
            self.customers_created.fetch_add(1, Ordering::SeqCst);
            Ok(format!("cus_{user_id}"))
        }

        async fn create_checkout_session(
            &self,
            customer_ref: &str,
            _user_id: DbId,
        ) -> Result<String, ProviderError> {
            self.check()?;
            Ok(format!("https://checkout.test/{customer_ref}"))
        }

        async fn create_portal_session(&self, customer_ref: &str) -> Result<String, ProviderError> {
            self.check()?;
            Ok(format!("https://portal.test/{customer_ref}"))
        }
    }

    fn setup(provider: FakeProvider) -> (Arc<MemoryStore>, Arc<FakeProvider>, EntitlementReconciler) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let reconciler = EntitlementReconciler::new(
            store.clone(),
            NotificationSink::new(store.clone()),
            provider.clone(),
        )
        .with_webhook_secret(Some(SECRET.into()));
        (store, provider, reconciler)
    }

    fn signed(body: &serde_json::Value) -> (Vec<u8>, String) {
        let payload = body.to_string().into_bytes();
        let header = signature_header(SECRET, Utc::now().timestamp(), &payload);
        (payload, header)
    }

    fn checkout_event(user_id: DbId, customer_ref: &str) -> serde_json::Value {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": customer_ref,
                "metadata": { "user_id": user_id.to_string() }
            } }
        })
    }

    // -- Push path -----------------------------------------------------------

    #[tokio::test]
    async fn push_upgrades_and_is_idempotent() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        let (payload, header) = signed(&checkout_event(5, "cus_5"));

        for _ in 0..2 {
            let outcome = reconciler.handle_push(&payload, Some(&header)).await;
            assert_matches!(outcome, Ok(PushOutcome::Upgraded { user_id: 5 }));
        }

        let row = store.entitlement(5).unwrap();
        assert!(row.is_paid());
        assert_eq!(row.billing_customer_ref.as_deref(), Some("cus_5"));
        assert!(store.notifications_for(5).is_empty());
    }

    #[tokio::test]
    async fn push_without_secret_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = EntitlementReconciler::new(
            store.clone(),
            NotificationSink::new(store.clone()),
            Arc::new(FakeProvider::default()),
        );
        let (payload, header) = signed(&checkout_event(5, "cus_5"));

        let result = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(result, Err(BillingError::WebhookSecretMissing));
        assert!(store.entitlement(5).is_none());
    }

    #[tokio::test]
    async fn push_with_bad_signature_changes_nothing() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        let payload = checkout_event(5, "cus_5").to_string().into_bytes();
        let forged = signature_header("not-the-secret", Utc::now().timestamp(), &payload);

        let result = reconciler.handle_push(&payload, Some(&forged)).await;
        assert_matches!(result, Err(BillingError::Signature(SignatureError::Mismatch)));

        let missing = reconciler.handle_push(&payload, None).await;
        assert_matches!(missing, Err(BillingError::SignatureHeaderMissing));

        assert!(store.entitlement(5).is_none());
        assert_eq!(store.entitlement_writes(), 0);
    }

    #[tokio::test]
    async fn push_without_user_is_acknowledged_noop() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        let (payload, header) = signed(&json!({
            "type": "checkout.session.completed",
            "data": { "object": { "customer": "cus_x", "metadata": {} } }
        }));

        let outcome = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(outcome, Ok(PushOutcome::Unresolved));
        assert_eq!(store.entitlement_writes(), 0);
    }

    #[tokio::test]
    async fn push_store_failure_is_returned() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        store.fail_entitlement_writes(true);
        let (payload, header) = signed(&checkout_event(5, "cus_5"));

        let result = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(result, Err(BillingError::Store(_)));
    }

    #[tokio::test]
    async fn push_rejects_unparseable_verified_body() {
        let (_, _, reconciler) = setup(FakeProvider::default());
        let payload = b"{not json".to_vec();
        let header = signature_header(SECRET, Utc::now().timestamp(), &payload);

        let result = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(result, Err(BillingError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn subscription_deleted_downgrades_by_customer() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        store.set_tier(8, Tier::Paid, Some("cus_8")).await.unwrap();
        let (payload, header) = signed(&json!({
            "type": "customer.subscription.deleted",
            "data": { "object": { "customer": "cus_8", "status": "canceled" } }
        }));

        let outcome = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(outcome, Ok(PushOutcome::Downgraded { user_id: 8 }));

        let row = store.entitlement(8).unwrap();
        assert!(!row.is_paid());
        assert_eq!(row.billing_customer_ref.as_deref(), Some("cus_8"));
    }

    #[tokio::test]
    async fn transitional_status_leaves_tier_alone() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        store.set_tier(8, Tier::Paid, Some("cus_8")).await.unwrap();
        let writes = store.entitlement_writes();
        let (payload, header) = signed(&json!({
            "type": "customer.subscription.updated",
            "data": { "object": { "customer": "cus_8", "status": "past_due" } }
        }));

        let outcome = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(outcome, Ok(PushOutcome::NoEvidence { .. }));
        assert!(store.entitlement(8).unwrap().is_paid());
        assert_eq!(store.entitlement_writes(), writes);
    }

    #[tokio::test]
    async fn unknown_customer_is_unresolved() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        let (payload, header) = signed(&json!({
            "type": "customer.subscription.deleted",
            "data": { "object": { "customer": "cus_nobody" } }
        }));

        let outcome = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(outcome, Ok(PushOutcome::Unresolved));
        assert_eq!(store.entitlement_writes(), 0);
    }

    #[tokio::test]
    async fn unhandled_event_type_is_ignored() {
        let (_, _, reconciler) = setup(FakeProvider::default());
        let (payload, header) = signed(&json!({ "type": "invoice.paid", "data": { "object": {} } }));

        let outcome = reconciler.handle_push(&payload, Some(&header)).await;
        assert_matches!(outcome, Ok(PushOutcome::Ignored { .. }));
    }

    // -- Pull path -----------------------------------------------------------

    #[tokio::test]
    async fn pull_upgrades_once_and_welcomes_once() {
        let (store, _, reconciler) = setup(FakeProvider::with_active());
        store.set_customer_ref(3, "cus_3").await.unwrap();

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::Upgraded);
        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::AlreadyPaid);

        assert!(store.entitlement(3).unwrap().is_paid());
        let rows = store.notifications_for(3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, WELCOME_TITLE);
        assert_eq!(rows[0].kind, "success");
    }

    #[tokio::test]
    async fn welcome_is_keyed_by_reference_day() {
        let (store, _, reconciler) = setup(FakeProvider::with_active());
        let reconciler = reconciler.with_zone(ReferenceZone::from_offset_minutes(14 * 60).unwrap());
        store.set_customer_ref(3, "cus_3").await.unwrap();

        // 12:00 UTC on Mar 1 is already Mar 2 at UTC+14.
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let local_day = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        store
            .insert(&NewNotification {
                user_id: 3,
                kind: NotificationKind::Success,
                title: WELCOME_TITLE.to_string(),
                message: WELCOME_MESSAGE.to_string(),
                link: Some(BILLING_LINK.to_string()),
                dedupe_key: Some(dedupe_key(WELCOME_TITLE, BILLING_LINK, local_day)),
            })
            .await
            .unwrap();

        assert_eq!(reconciler.sync_on_return_at(3, now).await, PullOutcome::Upgraded);
        assert!(store.entitlement(3).unwrap().is_paid());
        assert_eq!(store.notifications_for(3).len(), 1);
    }

    #[tokio::test]
    async fn pull_upgrades_trialing_subscription() {
        let provider = FakeProvider::default();
        provider.subscriptions.lock().unwrap().push(Subscription {
            id: "sub_trial".into(),
            status: "trialing".into(),
            created: 1_700_000_000,
        });
        let (store, _, reconciler) = setup(provider);
        store.set_customer_ref(3, "cus_3").await.unwrap();

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::Upgraded);
        assert!(store.entitlement(3).unwrap().is_paid());
    }

    #[tokio::test]
    async fn pull_after_push_sends_no_welcome() {
        let (store, _, reconciler) = setup(FakeProvider::with_active());
        let (payload, header) = signed(&checkout_event(3, "cus_3"));
        reconciler.handle_push(&payload, Some(&header)).await.unwrap();

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::AlreadyPaid);
        assert!(store.notifications_for(3).is_empty());
    }

    #[tokio::test]
    async fn pull_without_customer_skips_provider() {
        let (_, provider, reconciler) = setup(FakeProvider::with_active());

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::NoCustomer);
        assert_eq!(provider.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pull_never_demotes() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        store.set_tier(3, Tier::Paid, Some("cus_3")).await.unwrap();

        assert_eq!(
            reconciler.sync_on_return(3).await,
            PullOutcome::NoActiveSubscription
        );
        assert!(store.entitlement(3).unwrap().is_paid());
    }

    #[tokio::test]
    async fn pull_swallows_provider_failure() {
        let (store, provider, reconciler) = setup(FakeProvider::with_active());
        store.set_customer_ref(3, "cus_3").await.unwrap();
        provider.fail.store(true, Ordering::SeqCst);

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::Failed);
        assert!(!store.entitlement(3).unwrap().is_paid());
        assert!(store.notifications_for(3).is_empty());
    }

    #[tokio::test]
    async fn pull_swallows_store_failure() {
        let (store, _, reconciler) = setup(FakeProvider::with_active());
        store.set_customer_ref(3, "cus_3").await.unwrap();
        store.fail_entitlement_writes(true);

        assert_eq!(reconciler.sync_on_return(3).await, PullOutcome::Failed);
        assert!(store.notifications_for(3).is_empty());
    }

    // -- Hosted sessions -----------------------------------------------------

    #[tokio::test]
    async fn checkout_creates_customer_once_without_upgrading() {
        let (store, provider, reconciler) = setup(FakeProvider::default());

        let url = reconciler.start_checkout(4, Some("a@b.test")).await.unwrap();
        assert_eq!(url, "https://checkout.test/cus_4");
        reconciler.start_checkout(4, None).await.unwrap();

        assert_eq!(provider.customers_created.load(Ordering::SeqCst), 1);
        let row = store.entitlement(4).unwrap();
        assert!(!row.is_paid());
        assert_eq!(row.billing_customer_ref.as_deref(), Some("cus_4"));
    }

    #[tokio::test]
    async fn checkout_refused_when_already_paid() {
        let (store, _, reconciler) = setup(FakeProvider::default());
        store.set_tier(4, Tier::Paid, Some("cus_4")).await.unwrap();

        let result = reconciler.start_checkout(4, None).await;
        assert_matches!(result, Err(BillingError::Core(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn portal_requires_customer() {
        let (store, _, reconciler) = setup(FakeProvider::default());

        let missing = reconciler.open_portal(4).await;
        assert_matches!(missing, Err(BillingError::Core(CoreError::Validation(_))));

        store.set_customer_ref(4, "cus_4").await.unwrap();
        assert_eq!(
            reconciler.open_portal(4).await.unwrap(),
            "https://portal.test/cus_4"
        );
    }
}
