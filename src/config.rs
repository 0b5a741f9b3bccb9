// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    common::i18n::I18nStore,
    db::{
        AuditRepository, CredentialRepository, DocumentStore, MemoryDocumentStore,
        PgDocumentStore, TenantGateway,
    },
    services::{
        AuditService, AuthService, PermissionAdminService, PermissionEngine, RecordService,
        TenancyService, UserService,
    },
};

// Configuração lida do ambiente (.env aceito)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    // Sem DATABASE_URL o servidor sobe com o store em memória
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub bind_addr: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub audit_default_limit: usize,
    pub audit_max_limit: usize,
}

impl AppConfig {
    /// Valores padrão com o segredo informado.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            database_url: None,
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(3),
            bind_addr: "0.0.0.0:3000".to_string(),
            token_ttl_hours: 24 * 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            audit_default_limit: 100,
            audit_max_limit: 1000,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let defaults = Self::new(jwt_secret);

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr.clone())?,
            token_ttl_hours: env_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost)?,
            audit_default_limit: env_or("AUDIT_DEFAULT_LIMIT", defaults.audit_default_limit)?,
            audit_max_limit: env_or("AUDIT_MAX_LIMIT", defaults.audit_max_limit)?,
            ..defaults
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub engine: PermissionEngine,
    pub audit_service: AuditService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub tenancy_service: TenancyService,
    pub record_service: RecordService,
    pub permission_admin: PermissionAdminService,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    /// Abre o store indicado pela configuração e monta o estado.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => Arc::new(
                PgDocumentStore::connect(url, config.db_max_connections, config.db_acquire_timeout)
                    .await
                    .context("Falha ao conectar ao banco de dados")?,
            ),
            None => {
                tracing::warn!("⚠️ DATABASE_URL ausente: usando store em memória (dados não persistem)");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let gateway = TenantGateway::new(store.clone());
        let engine = PermissionEngine::new();

        let audit_service = AuditService::new(
            AuditRepository::new(store.clone()),
            config.audit_default_limit,
            config.audit_max_limit,
        );
        let auth_service = AuthService::new(
            gateway.clone(),
            CredentialRepository::new(store.clone()),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.token_ttl_hours),
        )
        .with_bcrypt_cost(config.bcrypt_cost);

        let user_service = UserService::new(
            gateway.clone(),
            auth_service.clone(),
            audit_service.clone(),
            engine.clone(),
        );
        let tenancy_service =
            TenancyService::new(gateway.clone(), auth_service.clone(), audit_service.clone());
        let record_service =
            RecordService::new(gateway.clone(), engine.clone(), audit_service.clone());
        let permission_admin = PermissionAdminService::new(gateway.clone());

        Self {
            store,
            engine,
            audit_service,
            auth_service,
            user_service,
            tenancy_service,
            record_service,
            permission_admin,
            i18n_store: Arc::new(I18nStore::default()),
        }
    }
}
