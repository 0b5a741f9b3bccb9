// src/db/pg_store.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};

use crate::common::error::AppError;
use crate::db::document_store::{Direction, DocumentStore, Filter, FilterOp, Query};
use crate::models::document::{Document, JsonMap};

// Todas as coleções vivem numa única tabela `documents (collection, id, data JSONB)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre a pool e aplica as migrações pendentes.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Ok(Self::new(pool))
    }
}

// ` AND (data -> campo) <op> valor`, com os mesmos tipos do store em memória
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    builder.push(" AND (data -> ");
    builder.push_bind(filter.field.clone());
    builder.push(")");
    match filter.op {
        // Campo ausente conta como "diferente", igual ao store em memória
        FilterOp::Ne => builder.push(" IS DISTINCT FROM "),
        op => builder.push(format!(" {} ", op.sql())),
    };
    builder.push_bind(Json(filter.value.clone()));
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn set(&self, collection: &str, id: &str, data: JsonMap) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
            .bind(collection)
            .bind(id)
            .bind(Json(data))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert(&self, collection: &str, id: &str, data: JsonMap) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
            .bind(collection)
            .bind(id)
            .bind(Json(data))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, (String, Json<JsonMap>)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, Json(data))| Document::new(id, data)))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());

        // Os filtros entram na ordem recebida, todos ligados por AND
        for filter in &query.filters {
            push_filter(&mut builder, filter);
        }

        if let Some(order) = &query.order_by {
            builder.push(" ORDER BY data -> ");
            builder.push_bind(order.field.clone());
            builder.push(match order.direction {
                Direction::Asc => " ASC NULLS LAST",
                Direction::Desc => " DESC NULLS LAST",
            });
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let rows = builder
            .build_query_as::<(String, Json<JsonMap>)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document::new(id, data))
            .collect())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE documents SET data = data || ");
        builder.push_bind(Json(patch));
        builder.push(" WHERE collection = ");
        builder.push_bind(collection.to_string());
        builder.push(" AND id = ");
        builder.push_bind(id.to_string());
        if let Some(condition) = condition {
            push_filter(&mut builder, condition);
        }

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("DELETE FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        builder.push(" AND id = ");
        builder.push_bind(id.to_string());
        if let Some(condition) = condition {
            push_filter(&mut builder, condition);
        }

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Pool de conexões com o banco fechada");
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
