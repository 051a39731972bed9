//! The mapper session: client, registry and configuration together.

use std::sync::Arc;

use kvmapper_client::{Client, Link, Record};

use crate::query::{Criteria, Query};
use crate::{Error, MapperConfig, Model, Object, Registry};

/// Entry point for storing and retrieving objects.
///
/// Cloning is cheap; clones share the client and the registry.
#[derive(Clone, Debug)]
pub struct Mapper {
    client: Client,
    registry: Arc<Registry>,
    config: MapperConfig,
}

impl Mapper {
    pub fn new(client: Client, registry: impl Into<Arc<Registry>>) -> Self {
        Self::with_config(client, registry, MapperConfig::default())
    }

    pub fn with_config(
        client: Client,
        registry: impl Into<Arc<Registry>>,
        config: MapperConfig,
    ) -> Self {
        Self {
            client,
            registry: registry.into(),
            config,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The object type registered for `bucket`.
    pub fn model(&self, bucket: &str) -> Result<&Arc<Model>, Error> {
        self.registry
            .by_bucket(bucket)
            .ok_or_else(|| Error::UnregisteredBucket {
                bucket: bucket.to_string(),
            })
    }

    /// Fetch one object by key.
    pub fn get(&self, model: &Arc<Model>, key: &str) -> Result<Object, Error> {
        let record = self.client.bucket(model.bucket()).get(key)?;
        if !record.exists() {
            return Err(Error::NoSuchObject {
                bucket: model.bucket().to_string(),
                key: key.to_string(),
            });
        }
        Ok(Object::load(model, record))
    }

    /// Plan a query over `model`. See [`Query`] for how a strategy is picked.
    pub fn query(&self, model: &Arc<Model>, criteria: Criteria) -> Result<Query<'_>, Error> {
        let query = Query::plan(self, model, criteria)?;
        log::trace!("{:?}", query);
        Ok(query)
    }

    /// Type a stored record through the registry.
    pub fn load(&self, record: Record) -> Result<Object, Error> {
        let model = self.model(record.bucket().name())?;
        Ok(Object::load(model, record))
    }

    /// Fetch the target of a link as a typed object.
    pub fn resolve(&self, link: &Link) -> Result<Object, Error> {
        let model = self.model(&link.bucket)?;
        self.get(model, &link.key)
    }
}
