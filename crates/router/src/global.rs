//! Optional process-wide router instance.
//!
//! Routers are normally constructed explicitly and passed to whatever wires up
//! the execution engine. Processes that want one shared instance install it
//! here; installation happens exactly once even under concurrent first use.

use crate::router::TenantRouter;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

static ROUTER: OnceCell<Arc<dyn Any + Send + Sync>> = OnceCell::new();

/// Returns the installed router, building it with `init` if none exists yet.
///
/// Every caller observes the same instance. Returns `None` only when a router
/// for a different connection type was installed first.
pub fn get_or_init<C, F>(init: F) -> Option<Arc<TenantRouter<C>>>
where
    C: Clone + Send + Sync + 'static,
    F: FnOnce() -> TenantRouter<C>,
{
    let installed = ROUTER.get_or_init(|| {
        tracing::info!(router = TenantRouter::<C>::NAME, "Installed global tenant router");
        Arc::new(init()) as Arc<dyn Any + Send + Sync>
    });
    Arc::clone(installed).downcast::<TenantRouter<C>>().ok()
}

/// The installed router, if any.
pub fn get<C>() -> Option<Arc<TenantRouter<C>>>
where
    C: Clone + Send + Sync + 'static,
{
    ROUTER
        .get()
        .and_then(|installed| Arc::clone(installed).downcast::<TenantRouter<C>>().ok())
}
