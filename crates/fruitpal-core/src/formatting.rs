use crate::models::CostLine;

/// Render one ranked cost line.
///
/// Country is left-aligned in three columns, the total right-aligned in
/// nine, and the breakdown repeats the formula's inputs.
///
/// # Examples
///
/// ```
/// use fruitpal_core::formatting::format_cost_line;
/// use fruitpal_core::models::CostLine;
///
/// let line = CostLine {
///     country: "BR".to_string(),
///     total_cost: 22060.1,
///     price_per_ton: 53.0,
///     variable_overhead: 1.42,
///     trade_volume: 405.0,
///     fixed_overhead: 20.0,
/// };
/// assert_eq!(
///     format_cost_line(&line),
///     "BR   22060.10 | ((53.00 +  1.42) * 405.00) + 20.00"
/// );
/// ```
pub fn format_cost_line(line: &CostLine) -> String {
    format!(
        "{:<3} {:>9.2} | (({:>5.2} + {:>5.2}) * {:>5.2}) + {:>5.2}",
        line.country,
        line.total_cost,
        line.price_per_ton,
        line.variable_overhead,
        line.trade_volume,
        line.fixed_overhead,
    )
}

/// Render an enumeration as an upper-cased header followed by one value per
/// line.
///
/// # Examples
///
/// ```
/// use fruitpal_core::formatting::format_listing;
///
/// let values = vec!["BR".to_string(), "MX".to_string()];
/// assert_eq!(format_listing("country", &values), "COUNTRY:\nBR\nMX");
/// ```
pub fn format_listing(key: &str, values: &[String]) -> String {
    let mut out = format!("{}:", key.to_uppercase());
    for value in values {
        out.push('\n');
        out.push_str(value);
    }
    out
}
