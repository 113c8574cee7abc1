//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{SkuResolver, SkuService};
use crate::config::Config;
use crate::db::{PgStore, StockStore, Store};
use crate::inventory::StockLedger;
use crate::notify::{HttpNotifier, NoopNotifier, Notifier};
use crate::orders::{CheckoutService, OrderMachine};
use crate::webhook::WebhookGate;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Every component receives its dependencies here, once — there are no
/// module-level service singletons, and the storage client is a trait
/// object so tests wire in the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ledger: StockLedger,
    pub skus: SkuService,
    pub resolver: SkuResolver,
    pub checkout: CheckoutService,
    pub machine: OrderMachine,
    pub gate: Arc<WebhookGate>,
}

impl AppState {
    /// Create the production state: PostgreSQL store, migrations, startup
    /// checks.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

        // The default warehouse is configuration, not data to fall back on —
        // refuse to start without it.
        let warehouse = store
            .get_warehouse(config.default_warehouse_id)
            .await?
            .ok_or_else(|| {
                format!(
                    "default warehouse {} not found; check DEFAULT_WAREHOUSE_ID",
                    config.default_warehouse_id
                )
            })?;
        tracing::info!(warehouse_id = warehouse.id, name = %warehouse.name, "default warehouse ready");

        let notifier: Arc<dyn Notifier> = match &config.notify_url {
            Some(url) => Arc::new(HttpNotifier::new(url.clone())),
            None => Arc::new(NoopNotifier),
        };

        Ok(Self::from_parts(
            store,
            notifier,
            config.default_warehouse_id,
            config.webhook_secret.clone(),
        ))
    }

    /// Wire the components over any store implementation. Tests use this
    /// with [`MemoryStore`](crate::db::memory::MemoryStore).
    pub fn from_parts(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        default_warehouse_id: i64,
        webhook_secret: String,
    ) -> Self {
        let ledger = StockLedger::new(store.clone(), default_warehouse_id);
        let resolver = SkuResolver::new(store.clone());
        let skus = SkuService::new(store.clone(), default_warehouse_id);
        let machine = OrderMachine::new(store.clone(), ledger.clone());
        let checkout = CheckoutService::new(store.clone(), resolver.clone(), ledger.clone());
        let gate = Arc::new(WebhookGate::new(
            store.clone(),
            machine.clone(),
            notifier,
            webhook_secret,
        ));

        Self {
            store,
            ledger,
            skus,
            resolver,
            checkout,
            machine,
            gate,
        }
    }
}
