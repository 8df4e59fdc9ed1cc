use crate::model::Model;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Isolation settings of one registered entity type.
pub struct IsolationDescriptor<C> {
    pub table_name: String,
    pub isolated: bool,
    /// Tenant field resolved at registration time
    pub tenant_field: String,
    pub model: Arc<dyn Model<C>>,
}

impl<C> Clone for IsolationDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            isolated: self.isolated,
            tenant_field: self.tenant_field.clone(),
            model: Arc::clone(&self.model),
        }
    }
}

impl<C> fmt::Debug for IsolationDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationDescriptor")
            .field("table_name", &self.table_name)
            .field("isolated", &self.isolated)
            .field("tenant_field", &self.tenant_field)
            .finish_non_exhaustive()
    }
}

/// Table name -> isolation descriptor lookup table.
pub struct IsolationRegistry<C> {
    default_tenant_field: String,
    entries: RwLock<HashMap<String, IsolationDescriptor<C>>>,
}

impl<C: Send + Sync + 'static> IsolationRegistry<C> {
    pub fn new(default_tenant_field: impl Into<String>) -> Self {
        Self {
            default_tenant_field: default_tenant_field.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite descriptors keyed by each model's table name.
    pub fn register<I>(&self, models: I)
    where
        I: IntoIterator<Item = Arc<dyn Model<C>>>,
    {
        let descriptors: Vec<_> = models
            .into_iter()
            .map(|model| {
                let tenant_field = model
                    .tenant_field()
                    .unwrap_or(&self.default_tenant_field)
                    .to_string();
                IsolationDescriptor {
                    table_name: model.table_name().to_string(),
                    isolated: model.is_tenant_isolated(),
                    tenant_field,
                    model,
                }
            })
            .collect();

        let mut entries = self.entries.write();
        for descriptor in descriptors {
            tracing::debug!(
                table = %descriptor.table_name,
                isolated = descriptor.isolated,
                "Registered model"
            );
            entries.insert(descriptor.table_name.clone(), descriptor);
        }
    }

    pub fn lookup(&self, table: &str) -> Option<IsolationDescriptor<C>> {
        self.entries.read().get(table).cloned()
    }

    /// First isolated descriptor among the candidate table names, in order.
    ///
    /// A registered but non-isolated entry stops the search: it is authoritative
    /// for that name.
    pub fn lookup_isolated<'a, I>(&self, candidates: I) -> Option<IsolationDescriptor<C>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entries = self.entries.read();
        for table in candidates {
            if let Some(descriptor) = entries.get(table) {
                return descriptor.isolated.then(|| descriptor.clone());
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
