//! Relationship endpoint converter.
//!
//! Reading a start/end property of a relationship yields the entity at that
//! end, looked up in the store. Writing is refused.

use crate::model::{Endpoint, Entity, SecurityContext, Value};
use crate::storage::Store;
use crate::{Error, Result};
use super::PropertyConverter;

pub struct EndpointConverter<'a, S: Store + ?Sized> {
    key: &'a str,
    store: &'a S,
    ctx: &'a SecurityContext,
    relationship: Option<&'a Entity>,
    endpoint: Endpoint,
}

impl<'a, S: Store + ?Sized> EndpointConverter<'a, S> {
    pub fn new(
        key: &'a str,
        store: &'a S,
        ctx: &'a SecurityContext,
        relationship: Option<&'a Entity>,
        endpoint: Endpoint,
    ) -> Self {
        Self { key, store, ctx, relationship, endpoint }
    }
}

impl<S: Store + ?Sized> PropertyConverter<Value, Value> for EndpointConverter<'_, S> {
    fn convert(&self, _source: Value) -> Result<Value> {
        Err(Error::ReadOnlyProperty { key: self.key.to_string() })
    }

    /// The stored value is ignored; the endpoint comes from the relationship.
    fn revert(&self, _target: Value) -> Result<Value> {
        let Some(endpoints) = self.relationship.and_then(|r| r.endpoints.as_ref()) else {
            return Ok(Value::Null);
        };
        let id = endpoints.get(self.endpoint);
        match self.store.get_entity(self.ctx, id)? {
            Some(entity) => Ok(Value::from(entity)),
            None => Err(Error::NotFound(format!("{:?} entity {id} of property '{}'", self.endpoint, self.key))),
        }
    }
}
