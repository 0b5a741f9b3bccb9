// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    db::{
        credential_repo::{normalize_email, ResetTicket},
        tenant_gateway::generate_id,
        CredentialRepository, TenantGateway,
    },
    models::auth::{AuthResponse, Claims, Credential, Identity, Role},
    models::document::JsonMap,
    services::user_service::USERS_COLLECTION,
};

const RESET_TICKET_TTL_MINUTES: i64 = 60;

// Dados mínimos de uma conta nova
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService {
    gateway: TenantGateway,
    credentials: CredentialRepository,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        gateway: TenantGateway,
        credentials: CredentialRepository,
        jwt_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            credentials,
            jwt_secret,
            token_ttl,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Cria a identidade (coleção `users`, na escola `tenant_id`) e a credencial.
    /// Não gera token: usado também quando um administrador cadastra alguém.
    pub async fn create_account(&self, account: &NewAccount, tenant_id: &str) -> Result<Identity, AppError> {
        let email = normalize_email(&account.email);

        // 1. Recusa cedo o e-mail já usado (a garantia de unicidade é o passo 4)
        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // 2. Hashing fora do runtime assíncrono
        let password_hash = hash_password(&account.password, self.bcrypt_cost).await?;

        // 3. Identidade
        let data = identity_data(&email, &account.name, account.role);
        let user_id = self.gateway.create(USERS_COLLECTION, data, tenant_id, None).await?;

        // 4. Credencial, inserida só se o e-mail está livre. Se outro cadastro
        //    ganhou a corrida, desfaz a identidade.
        let credential = Credential {
            email: email.clone(),
            password_hash,
            user_id: user_id.clone(),
            tenant_id: tenant_id.to_string(),
        };
        if let Err(e) = self.credentials.create(&credential).await {
            if let Err(cleanup) = self.gateway.delete(USERS_COLLECTION, &user_id, tenant_id).await {
                tracing::error!(user_id = %user_id, error = ?cleanup, "falha ao desfazer identidade órfã");
            }
            return Err(e);
        }

        tracing::info!(user_id = %user_id, tenant_id, role = %account.role, "👤 conta criada");
        self.load_identity(&user_id, tenant_id).await
    }

    pub async fn sign_up(&self, account: &NewAccount, tenant_id: &str) -> Result<AuthResponse, AppError> {
        let user = self.create_account(account, tenant_id).await?;
        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let credential = self
            .credentials
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &credential.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let user = self
            .load_identity(&credential.user_id, &credential.tenant_id)
            .await?;
        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Token -> identidade atual. Rejeita token revogado (logout) ou expirado.
    pub async fn validate_token(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self.decode_claims(token)?;

        if self.credentials.is_token_revoked(&claims.jti).await? {
            return Err(AppError::InvalidToken);
        }

        self.load_identity(&claims.sub, &claims.tenant).await
    }

    /// Revoga o token até a expiração natural dele.
    pub async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        let claims = self.decode_claims(token)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        self.credentials.revoke_token(&claims.jti, expires_at).await?;
        tracing::info!(user_id = %claims.sub, "logout");
        Ok(())
    }

    /// Gera um ticket de redefinição (uso único, 1h). A resposta ao cliente é a mesma
    /// exista ou não o e-mail; o envio da mensagem fica fora deste serviço.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError> {
        let email = normalize_email(email);
        if self.credentials.find_by_email(&email).await?.is_none() {
            tracing::info!("pedido de redefinição para e-mail não cadastrado");
            return Ok(None);
        }

        let token = generate_id();
        let ticket = ResetTicket {
            email: email.clone(),
            expires_at: Utc::now() + Duration::minutes(RESET_TICKET_TTL_MINUTES),
        };
        self.credentials.save_reset_ticket(&token, &ticket).await?;

        tracing::info!(email = %email, "📧 ticket de redefinição de senha gerado");
        Ok(Some(token))
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let ticket = self
            .credentials
            .take_reset_ticket(token)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if ticket.expires_at < Utc::now() {
            return Err(AppError::InvalidToken);
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        self.credentials
            .update_password_hash(&ticket.email, &password_hash)
            .await?;

        tracing::info!(email = %ticket.email, "senha redefinida");
        Ok(())
    }

    async fn load_identity(&self, user_id: &str, tenant_id: &str) -> Result<Identity, AppError> {
        let doc = self
            .gateway
            .get(USERS_COLLECTION, user_id, tenant_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        Ok(doc.into_model()?)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    fn create_token(&self, user: &Identity) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at: DateTime<Utc> = now + self.token_ttl;

        let claims = Claims {
            sub: user.id.clone(),
            tenant: user.tenant_id.clone(),
            jti: generate_id(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

fn identity_data(email: &str, name: &str, role: Role) -> JsonMap {
    let value = json!({
        "email": email,
        "name": name,
        "role": role,
    });
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}
