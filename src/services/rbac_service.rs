// src/services/rbac_service.rs

//! Motor de decisão de permissões.
//!
//! Uma cadeia fixa de estratégias puras, avaliadas em ordem; a primeira que
//! decide vence:
//!
//! 1. [`RoleBypassStrategy`]: `tenant_admin` pode tudo;
//! 2. [`CustomGrantStrategy`]: concessões personalizadas (se existirem) substituem o padrão;
//! 3. [`RoleDefaultStrategy`]: tabela padrão do perfil;
//! 4. [`DefaultDenyStrategy`]: nega.
//!
//! Sem estado e sem efeitos colaterais: pode ser chamado em cada requisição.

use std::sync::Arc;

use crate::models::auth::{Identity, Role};
use crate::models::rbac::find_grant;
use crate::services::permission_model::role_default_allows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// Um elo da cadeia. `None` passa a decisão para o próximo.
pub trait DecisionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, identity: &Identity, module: &str, action: &str) -> Option<Decision>;
}

pub struct RoleBypassStrategy;

impl DecisionStrategy for RoleBypassStrategy {
    fn name(&self) -> &'static str {
        "role_bypass"
    }

    fn evaluate(&self, identity: &Identity, _module: &str, _action: &str) -> Option<Decision> {
        (identity.role == Role::TenantAdmin).then_some(Decision::Allow)
    }
}

pub struct CustomGrantStrategy;

impl DecisionStrategy for CustomGrantStrategy {
    fn name(&self) -> &'static str {
        "custom_grant"
    }

    // Lista personalizada presente decide sozinha: módulo fora dela é negado.
    fn evaluate(&self, identity: &Identity, module: &str, action: &str) -> Option<Decision> {
        let grants = identity.custom_permissions()?;
        let allowed = find_grant(grants, module).is_some_and(|g| g.allows(action));
        Some(Decision::from_bool(allowed))
    }
}

pub struct RoleDefaultStrategy;

impl DecisionStrategy for RoleDefaultStrategy {
    fn name(&self) -> &'static str {
        "role_default"
    }

    fn evaluate(&self, identity: &Identity, module: &str, action: &str) -> Option<Decision> {
        role_default_allows(identity.role, module, action).then_some(Decision::Allow)
    }
}

pub struct DefaultDenyStrategy;

impl DecisionStrategy for DefaultDenyStrategy {
    fn name(&self) -> &'static str {
        "default_deny"
    }

    fn evaluate(&self, _identity: &Identity, _module: &str, _action: &str) -> Option<Decision> {
        Some(Decision::Deny)
    }
}

#[derive(Clone)]
pub struct PermissionEngine {
    strategies: Arc<Vec<Box<dyn DecisionStrategy>>>,
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(RoleBypassStrategy),
            Box::new(CustomGrantStrategy),
            Box::new(RoleDefaultStrategy),
            Box::new(DefaultDenyStrategy),
        ])
    }
}

impl PermissionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DecisionStrategy>>) -> Self {
        Self {
            strategies: Arc::new(strategies),
        }
    }

    /// Pode `identity` executar `action` em `module`? Sem identidade, nunca.
    pub fn is_allowed(&self, identity: Option<&Identity>, module: &str, action: &str) -> bool {
        let Some(identity) = identity else {
            return false;
        };

        for strategy in self.strategies.iter() {
            if let Some(decision) = strategy.evaluate(identity, module, action) {
                tracing::trace!(
                    user_id = %identity.id,
                    module,
                    action,
                    strategy = strategy.name(),
                    ?decision,
                    "decisão de permissão"
                );
                return decision == Decision::Allow;
            }
        }

        // Cadeia sem elo final: nega
        false
    }
}
