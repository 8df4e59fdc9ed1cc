pub mod config;
pub mod connections;
pub mod context;
pub mod error;
pub mod global;
pub mod migration;
pub mod model;
pub mod predicate;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod tenant;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConnectionConfig, TenantRouterConfig};
pub use connections::ConnectionRouter;
pub use context::{OperationContext, OperationKind};
pub use error::{Result, RouterError, ERROR_PREFIX};
pub use migration::MigrationTracker;
pub use model::{ConnectionFactory, Model};
pub use predicate::{CompareOp, Predicate, Value};
pub use registry::{IsolationDescriptor, IsolationRegistry};
pub use resolver::{ResolutionStrategy, TenantResolver};
pub use router::{OperationInterceptor, TenantRouter, TenantRouterStats};
pub use tenant::TenantId;
