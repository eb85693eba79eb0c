use super::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Field-level changes of one entity, keyed by wire name.
///
/// A field that became absent is stored as an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    fields: Map<String, Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }

    /// Records `live` under `field` when it differs from `prior`.
    pub fn track<T>(&mut self, field: &str, live: &T, prior: &T) -> Result<()>
    where
        T: PartialEq + Serialize,
    {
        if live != prior {
            self.fields.insert(field.to_string(), serde_json::to_value(live)?);
        }
        Ok(())
    }

    /// Records a to-one relation when the referenced key changed.
    pub fn track_relation<R>(
        &mut self,
        field: &str,
        live: Option<&crate::Entity<R>>,
        prior: Option<&crate::Entity<R>>,
    ) -> Result<()>
    where
        R: crate::Record,
    {
        let live_ref = live.map(|entity| entity.reference()).transpose()?;
        let prior_ref = prior.map(|entity| entity.reference()).transpose()?;
        if live_ref != prior_ref {
            self.fields
                .insert(field.to_string(), live_ref.unwrap_or(Value::Null));
        }
        Ok(())
    }
}
