/// Formatação pt-BR usada nas mensagens do bot
use chrono::NaiveDate;

/// Formata um valor monetário como `R$ 1.234,56`
///
/// Aceita o valor como vem da SOST ("1500.5", "1500,50", "1500"). Valores
/// ilegíveis viram `R$ 0,00`.
pub fn format_currency_brl(raw: &str) -> String {
    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };

    let value = normalized.trim().parse::<f64>().unwrap_or(0.0);
    let value = if value.is_finite() { value } else { 0.0 };

    let cents = (value.abs() * 100.0).round() as u64;
    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

/// Formata a data de vencimento como `DD/MM/AAAA`
///
/// A SOST manda `AAAA-MM-DD` ou `AAAA-MM-DD HH:MM:SS`.
pub fn format_date_br(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };

    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) if NaiveDate::parse_from_str(date_part, "%d/%m/%Y").is_ok() => date_part.to_string(),
        Err(_) => "N/A".to_string(),
    }
}
