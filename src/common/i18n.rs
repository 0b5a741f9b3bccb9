// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens: (código do erro, [(idioma, texto)])
const MESSAGES: &[(&str, &[(&str, &str)])] = &[
    ("validation", &[
        ("en", "One or more fields are invalid."),
        ("pt", "Um ou mais campos são inválidos."),
    ]),
    ("email_already_exists", &[
        ("en", "This email is already in use."),
        ("pt", "Este e-mail já está em uso."),
    ]),
    ("invalid_credentials", &[
        ("en", "Invalid email or password."),
        ("pt", "E-mail ou senha inválidos."),
    ]),
    ("invalid_token", &[
        ("en", "Missing or invalid authentication token."),
        ("pt", "Token de autenticação inválido ou ausente."),
    ]),
    ("user_not_found", &[
        ("en", "User not found."),
        ("pt", "Usuário não encontrado."),
    ]),
    ("forbidden", &[
        ("en", "You do not have permission to perform this action."),
        ("pt", "Você não tem permissão para realizar esta ação."),
    ]),
    ("access_denied", &[
        ("en", "Access denied: the record belongs to another school."),
        ("pt", "Acesso negado: o registro pertence a outra escola."),
    ]),
    ("not_found", &[
        ("en", "Record not found."),
        ("pt", "Registro não encontrado."),
    ]),
    ("already_exists", &[
        ("en", "A record with this id already exists."),
        ("pt", "Já existe um registro com este id."),
    ]),
    ("invalid_permission", &[
        ("en", "Unknown module or action."),
        ("pt", "Módulo ou ação desconhecidos."),
    ]),
    ("bad_request", &[
        ("en", "Invalid request."),
        ("pt", "Requisição inválida."),
    ]),
    ("internal", &[
        ("en", "An unexpected error occurred."),
        ("pt", "Ocorreu um erro inesperado."),
    ]),
];

/// Mensagens traduzidas por código de erro, carregadas uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let messages = MESSAGES
            .iter()
            .map(|(code, texts)| (*code, texts.iter().copied().collect()))
            .collect();
        Self { messages }
    }
}

impl I18nStore {
    pub fn translate(&self, lang: &str, code: &str) -> String {
        let Some(texts) = self.messages.get(code).or_else(|| self.messages.get("internal")) else {
            return code.to_string();
        };

        texts
            .get(lang)
            .or_else(|| texts.get(DEFAULT_LANG))
            .map(|t| t.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}
