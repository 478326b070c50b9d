/// Utilitários para manipulação segura de strings UTF-8
use deunicode::deunicode;

/// Trunca uma string de forma segura, garantindo que o índice não corte no meio de um caractere UTF-8
///
/// # Exemplo
/// ```
/// use kommo_sost_middleware::utils::string_utils::truncate_safe;
///
/// let text = "Olá, mundo! 🌍";
/// assert_eq!(truncate_safe(text, 3), "Ol");
/// ```
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Trunca uma string e adiciona um sufixo (como "...") de forma segura
pub fn truncate_with_suffix(s: &str, max_bytes: usize, suffix: &str) -> String {
    let truncated = truncate_safe(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{}{}", truncated, suffix)
    } else {
        truncated.to_string()
    }
}

/// Normaliza uma resposta livre do cliente: sem acentos, minúscula, sem espaços nas pontas
pub fn normalize_answer(s: &str) -> String {
    deunicode(s.trim()).to_lowercase()
}

/// Nome de arquivo seguro para o Kommo Drive
///
/// Maiúsculas, sem acentos, apenas `[A-Z0-9_.-]`. Se nada sobrar, usa `BOLETO.pdf`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = deunicode(name)
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    // ".PDF" sozinho não é um nome útil
    if sanitized.trim_matches('.').eq_ignore_ascii_case("pdf") || sanitized.trim_matches('.').is_empty() {
        return "BOLETO.pdf".to_string();
    }

    match sanitized.strip_suffix(".PDF") {
        Some(stem) => format!("{}.pdf", stem),
        None => sanitized,
    }
}
