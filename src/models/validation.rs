// src/models/validation.rs
// Validadores custom partilhados pelos payloads (usados via #[validate(custom(...))]).
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

// 00000-000 ou 00000000
static CEP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("regex de CEP válida"));

fn erro(code: &'static str, message: &'static str) -> ValidationError {
    let mut e = ValidationError::new(code);
    e.message = Some(Cow::Borrowed(message));
    e
}

/// Só dígitos (remove pontos, traços, parênteses e espaços).
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// CPF: 11 dígitos, aceitando a máscara 000.000.000-00.
pub fn validar_cpf(cpf: &str) -> Result<(), ValidationError> {
    if cpf.chars().any(|c| !(c.is_ascii_digit() || c == '.' || c == '-')) {
        return Err(erro("cpf", "CPF deve conter apenas números"));
    }
    if digits_only(cpf).len() != 11 {
        return Err(erro("cpf", "CPF deve ter 11 dígitos"));
    }
    Ok(())
}

pub fn validar_cep(cep: &str) -> Result<(), ValidationError> {
    if CEP_REGEX.is_match(cep.trim()) {
        Ok(())
    } else {
        Err(erro("cep", "CEP deve ter formato 00000-000"))
    }
}

/// Telefone com DDD: 10 ou 11 dígitos (fixo ou celular).
pub fn validar_telefone(telefone: &str) -> Result<(), ValidationError> {
    let n = digits_only(telefone).len();
    if (10..=11).contains(&n) {
        Ok(())
    } else {
        Err(erro("telefone", "Telefone deve ter DDD e 10 ou 11 dígitos"))
    }
}

/// Texto obrigatório: rejeita strings só com espaços.
pub fn nao_vazio(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(erro("required", "Campo obrigatório"))
    } else {
        Ok(())
    }
}

/// Converte "" (select vazio na UI) em None.
pub fn opcional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
