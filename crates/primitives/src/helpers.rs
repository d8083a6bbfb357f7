use sha2::{Digest, Sha256};

/// Prefixes `0x` unless the string already carries it.
pub fn hex_add_0x(hexs: &str) -> String {
    if hexs.starts_with("0x") {
        hexs.to_string()
    } else {
        format!("0x{hexs}")
    }
}

/// Strips a leading `0x` if present.
pub fn hex_strip_0x(hexs: &str) -> &str {
    hexs.strip_prefix("0x").unwrap_or(hexs)
}

/// Hashes the payload of a `0x`-prefixed hex string and returns the digest
/// in the same form.
pub fn sha256_hex(params: &str) -> Result<String, hex::FromHexError> {
    let bytes = hex::decode(hex_strip_0x(params))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("0x{}", hex::encode(hasher.finalize())))
}

/// Splits a symbol-suffixed decimal quantity such as `"5.0000 EOS"` into
/// its amount and symbol parts.
pub fn parse_quantity(quantity: &str) -> Option<(&str, &str)> {
    let mut parts = quantity.split(' ');
    let amount = parts.next().filter(|s| !s.is_empty())?;
    let symbol = parts.next().filter(|s| !s.is_empty())?;
    Some((amount, symbol))
}

/// Token identity for a quantity held by `account`: `account:SYMBOL`.
pub fn encode_token(account: &str, quantity: &str) -> Option<String> {
    let (_, symbol) = parse_quantity(quantity)?;
    Some(encode_token_with_symbol(account, symbol))
}

pub fn encode_token_with_symbol(account: &str, symbol: &str) -> String {
    format!("{account}:{symbol}")
}

/// Renders integer token units as a decimal-padded quantity string,
/// e.g. `(50000, 4, "EOS")` -> `"5.0000 EOS"`.
pub fn format_units(amount: u64, decimals: u32, symbol: &str) -> String {
    if decimals == 0 {
        return format!("{amount} {symbol}");
    }
    let scale = 10u64.pow(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    format!("{whole}.{frac:0width$} {symbol}", width = decimals as usize)
}
