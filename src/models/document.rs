// src/models/document.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Corpo de um documento: campos de primeiro nível em JSON.
pub type JsonMap = Map<String, Value>;

// Um documento do store: id + campos. Serializa "achatado" ({ "id": ..., ...campos }).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    #[schema(example = "3f2a9c1e0b7d4e2f8a6c5b4d3e2f1a0b")]
    pub id: String,

    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub data: JsonMap,
}

impl Document {
    pub fn new(id: impl Into<String>, data: JsonMap) -> Self {
        Self { id: id.into(), data }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Desserializa o documento inteiro (id incluído) num tipo do domínio.
    pub fn into_model<T: serde::de::DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let mut data = self.data;
        data.insert("id".into(), Value::String(self.id));
        serde_json::from_value(Value::Object(data))
    }
}

/// Converte um valor serializável num mapa de campos (o `id`, se houver, é removido).
pub fn to_json_map<T: Serialize>(value: &T) -> Result<JsonMap, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => {
            let mut map = JsonMap::new();
            map.insert("value".into(), other);
            Ok(map)
        }
    }
}
