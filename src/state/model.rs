use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anything that exposes named fields to templates and lists
pub trait Record {
    fn field(&self, name: &str) -> Option<Value>;
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// A typed model: a name, an optional identity and an attribute bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub id: Option<Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Fields come from the attribute bag; `id` falls back to the model identity
impl Record for Model {
    fn field(&self, name: &str) -> Option<Value> {
        match self.attributes.get(name) {
            Some(value) => Some(value.clone()),
            None if name == "id" => self.id.clone(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_fields_come_from_attributes() {
        let model = Model::new("contact").with_id(7).with("name", "Ada");
        assert_eq!(model.field("name"), Some(json!("Ada")));
        assert_eq!(model.field("id"), Some(json!(7)));
        assert_eq!(model.field("email"), None);
        assert_eq!(crate::template::substitute("<%= name %>", &model), "Ada");
    }
}
