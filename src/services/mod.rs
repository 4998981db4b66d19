// src/services/mod.rs
pub mod aluno_service;
pub mod auth_service;
pub mod checkout_service;
pub mod moderador_service;
pub mod pre_registration_service;
pub mod stats_service;
pub mod turma_service;
pub mod user_service;

/// Padrão LIKE "contém `termo`", com `%`, `_` e `\` escapados
/// (usar com `ESCAPE '\'`).
pub(crate) fn like_contains(termo: &str) -> String {
    let mut padrao = String::with_capacity(termo.len() + 2);
    padrao.push('%');
    for c in termo.chars() {
        if matches!(c, '%' | '_' | '\\') {
            padrao.push('\\');
        }
        padrao.push(c);
    }
    padrao.push('%');
    padrao
}

#[cfg(test)]
mod tests {
    use super::like_contains;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains("ana"), "%ana%");
        assert_eq!(like_contains("50%_a"), r"%50\%\_a%");
        assert_eq!(like_contains(r"a\b"), r"%a\\b%");
        assert_eq!(like_contains(""), "%%");
    }
}
