use crate::error::{OrmLifecycleError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Thread-safe dependency injection container.
///
/// Instances are stored behind an `Arc`, so every `resolve` of the same type
/// hands out the same shared instance.
#[derive(Clone, Default)]
pub struct Container {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let entry = self.services.get(&TypeId::of::<T>()).ok_or_else(|| {
            OrmLifecycleError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| OrmLifecycleError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
