use crate::error::{Result, RouterError};
use crate::predicate::Predicate;
use crate::tenant::TenantId;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// Category of a data-access call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Query,
    Update,
    Delete,
    Row,
    Raw,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Query => "query",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Row => "row",
            OperationKind::Raw => "raw",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation state seen by the interceptor and the execution engine.
///
/// The engine must call [`OperationContext::check`] before executing and use
/// [`OperationContext::target`] as the connection, falling back to its default
/// connection when no target was bound.
#[derive(Debug)]
pub struct OperationContext<C> {
    table: String,
    model_table: Option<String>,
    kind: OperationKind,
    predicate: Option<Predicate>,
    payload: Option<JsonValue>,
    bound_tenant: Option<TenantId>,
    tenant: Option<TenantId>,
    target: Option<C>,
    failure: Option<RouterError>,
}

impl<C> OperationContext<C> {
    pub fn new(kind: OperationKind, table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            model_table: None,
            kind,
            predicate: None,
            payload: None,
            bound_tenant: None,
            tenant: None,
            target: None,
            failure: None,
        }
    }

    /// Insert of a single object or a batch (JSON array of objects).
    pub fn create(table: impl Into<String>, payload: JsonValue) -> Self {
        let mut ctx = Self::new(OperationKind::Create, table);
        ctx.payload = Some(payload);
        ctx
    }

    /// Insert of any serializable entity or slice of entities.
    pub fn create_from<T: Serialize + ?Sized>(
        table: impl Into<String>,
        entities: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::create(table, serde_json::to_value(entities)?))
    }

    pub fn query(table: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, table)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(OperationKind::Update, table)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(OperationKind::Delete, table)
    }

    pub fn row(table: impl Into<String>) -> Self {
        Self::new(OperationKind::Row, table)
    }

    pub fn raw(table: impl Into<String>) -> Self {
        Self::new(OperationKind::Raw, table)
    }

    /// Adds a filter term, AND-ed with any existing predicate.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Canonical table of the model when the statement targets another name.
    pub fn with_model_table(mut self, table: impl Into<String>) -> Self {
        self.model_table = Some(table.into());
        self
    }

    /// Pre-binds the tenant of a row or raw operation.
    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.bound_tenant = Some(tenant);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn model_table(&self) -> Option<&str> {
        self.model_table.as_deref()
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn payload(&self) -> Option<&JsonValue> {
        self.payload.as_ref()
    }

    pub fn bound_tenant(&self) -> Option<&TenantId> {
        self.bound_tenant.as_ref()
    }

    /// Tenant the operation was routed to
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Connection the operation must execute on; `None` means the default one.
    pub fn target(&self) -> Option<&C> {
        self.target.as_ref()
    }

    pub fn into_target(self) -> Option<C> {
        self.target
    }

    pub(crate) fn bind_target(&mut self, tenant: TenantId, connection: C) {
        self.tenant = Some(tenant);
        self.target = Some(connection);
    }

    /// Records a failure. The first failure wins.
    pub fn fail(&mut self, error: RouterError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    pub fn failure(&self) -> Option<&RouterError> {
        self.failure.as_ref()
    }

    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }

    /// Gate for the execution engine
    pub fn check(&self) -> Result<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
