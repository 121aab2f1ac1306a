use crate::error::AppError;

/// Uppercases and trims a comma-separated symbol list.
///
/// Empty entries are dropped and repeats collapse onto their first occurrence,
/// so `"aapl, msft"` and `"AAPL,MSFT"` normalize identically.
pub fn normalize_symbols(raw: &str) -> Result<Vec<String>, AppError> {
    let mut symbols: Vec<String> = Vec::new();

    for part in raw.split(',') {
        let symbol = part.trim().to_uppercase();
        if symbol.is_empty() || symbols.contains(&symbol) {
            continue;
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(AppError::ValidationError("Missing 'symbols' parameter".into()));
    }

    Ok(symbols)
}

pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::ValidationError("symbol query param is required".into()));
    }
    if symbol.contains(',') {
        return Err(AppError::ValidationError("Only one symbol is allowed".into()));
    }
    Ok(symbol)
}
