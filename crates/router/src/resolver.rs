//! Tenant resolution from the shape of an operation.
//!
//! Inserts carry the tenant inside the entity values; filtered operations pin
//! it through an equality term of their predicate. Row and raw operations have
//! no shape to inspect and only route when the caller pre-binds a tenant.

use crate::context::{OperationContext, OperationKind};
use crate::error::{Result, RouterError};
use crate::predicate::Predicate;
use crate::tenant::TenantId;
use serde_json::Value as JsonValue;

/// How the tenant of an operation is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    EntityValue,
    PredicateText,
    PreBound,
}

impl From<OperationKind> for ResolutionStrategy {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Create => ResolutionStrategy::EntityValue,
            OperationKind::Query | OperationKind::Update | OperationKind::Delete => {
                ResolutionStrategy::PredicateText
            }
            OperationKind::Row | OperationKind::Raw => ResolutionStrategy::PreBound,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantResolver;

impl TenantResolver {
    /// Resolve the tenant of `ctx` using the strategy for its kind.
    ///
    /// `Ok(None)` means the operation carries no tenant id; routing rejects it.
    pub fn resolve<C>(&self, ctx: &OperationContext<C>, tenant_field: &str) -> Result<Option<TenantId>> {
        match ResolutionStrategy::from(ctx.kind()) {
            ResolutionStrategy::EntityValue => match ctx.payload() {
                Some(payload) => self.from_entities(payload, tenant_field),
                None => Ok(None),
            },
            ResolutionStrategy::PredicateText => {
                self.from_predicate(ctx.predicate(), ctx.table(), tenant_field)
            }
            ResolutionStrategy::PreBound => Ok(ctx.bound_tenant().cloned()),
        }
    }

    /// Tenant shared by every entity in the payload.
    ///
    /// Zero values (missing, null, empty or blank string, `0`, `false`) are
    /// skipped; any other non-string value is a type error, and two different
    /// tenants in one batch are a consistency error.
    pub fn from_entities(&self, payload: &JsonValue, tenant_field: &str) -> Result<Option<TenantId>> {
        match payload {
            JsonValue::Array(entities) => {
                let mut tenant: Option<TenantId> = None;
                for entity in entities {
                    let Some(candidate) = entity_tenant(entity, tenant_field)? else {
                        continue;
                    };
                    match &tenant {
                        Some(existing) if *existing != candidate => {
                            return Err(RouterError::Consistency {
                                first: existing.to_string(),
                                second: candidate.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => tenant = Some(candidate),
                    }
                }
                Ok(tenant)
            }
            JsonValue::Object(_) => entity_tenant(payload, tenant_field),
            _ => Ok(None),
        }
    }

    /// Tenant pinned by the filter predicate.
    pub fn from_predicate(
        &self,
        predicate: Option<&Predicate>,
        table: &str,
        tenant_field: &str,
    ) -> Result<Option<TenantId>> {
        let predicate = predicate.ok_or_else(|| RouterError::missing_predicate(table))?;
        Ok(predicate
            .tenant_value(tenant_field)
            .and_then(|value| TenantId::parse(&value)))
    }
}

fn entity_tenant(entity: &JsonValue, tenant_field: &str) -> Result<Option<TenantId>> {
    let value = match entity {
        JsonValue::Object(fields) => fields.get(tenant_field),
        _ => None,
    };

    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(TenantId::parse(s)),
        Some(JsonValue::Bool(false)) => Ok(None),
        Some(JsonValue::Number(n)) if n.as_f64() == Some(0.0) => Ok(None),
        Some(other) => Err(RouterError::TypeMismatch {
            field: tenant_field.to_string(),
            found: json_kind(other).to_string(),
        }),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
