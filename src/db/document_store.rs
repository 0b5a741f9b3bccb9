// src/db/document_store.rs

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::document::{Document, JsonMap};

// ---
// Forma das consultas aceitas pelo store
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
        }
    }
}

/// Predicado sobre um campo de primeiro nível do documento.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn matches(&self, data: &JsonMap) -> bool {
        let Some(actual) = data.get(&self.field) else {
            // Campo ausente só satisfaz "diferente de".
            return self.op == FilterOp::Ne;
        };

        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Ne => actual != &self.value,
            op => match compare_values(actual, &self.value) {
                Some(ord) => match op {
                    FilterOp::Lt => ord == Ordering::Less,
                    FilterOp::Lte => ord != Ordering::Greater,
                    FilterOp::Gt => ord == Ordering::Greater,
                    FilterOp::Gte => ord != Ordering::Less,
                    FilterOp::Eq | FilterOp::Ne => unreachable!(),
                },
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Consulta: filtros (AND, na ordem), ordenação e limite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, data: &JsonMap) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }
}

/// Ordem entre valores JSON comparáveis: números com números, textos com textos,
/// booleanos com booleanos. Tipos diferentes não se comparam.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Aplica ordenação e limite a documentos já filtrados.
pub fn sort_and_limit(mut docs: Vec<Document>, query: &Query) -> Vec<Document> {
    if let Some(order) = &query.order_by {
        docs.sort_by(|a, b| {
            let ord = match (a.data.get(&order.field), b.data.get(&order.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                // Documentos sem o campo vão para o fim
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        docs.truncate(limit);
    }
    docs
}

// ---
// A fronteira com o banco de documentos
// ---

/// Cliente do banco de documentos. Criado na inicialização e fechado no desligamento.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Grava o documento inteiro (cria ou substitui).
    async fn set(&self, collection: &str, id: &str, data: JsonMap) -> Result<(), AppError>;

    /// Cria o documento só se o id ainda não existe, numa única operação atômica.
    /// Retorna `false` (sem escrever nada) se já existe.
    async fn insert(&self, collection: &str, id: &str, data: JsonMap) -> Result<bool, AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError>;

    /// Mescla campos de primeiro nível num documento existente.
    /// Com `condition`, a escrita só acontece se o documento atual satisfaz o filtro
    /// (checado na mesma operação). Retorna `false` se nada foi escrito.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError>;

    /// Mesma regra de `condition` do `merge`. Retorna `false` se nada foi apagado.
    async fn delete(
        &self,
        collection: &str,
        id: &str,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;

    async fn close(&self);

    fn backend_name(&self) -> &'static str;
}
