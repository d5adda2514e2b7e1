use crate::core::Quote;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Colors a variation as reported by the source ("1.19", "-1.69") by its sign.
pub fn variation_cell(variation: Option<&str>) -> Cell {
    let Some(text) = variation else {
        return format_optional_cell(None::<&str>, str::to_string);
    };
    let color = match text.trim().parse::<f64>() {
        Ok(change) if change < 0.0 => Color::Red,
        Ok(_) => Color::Green,
        Err(_) => Color::Reset,
    };
    Cell::new(format!("{}%", text.trim().replace('.', ",")))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Formats a value in Brazilian reais, e.g. `R$ 1.234,56`.
///
/// Values below one keep four decimals so that weak currencies stay readable.
pub fn format_brl(value: f64) -> String {
    // Pick precision on the rounded value so 0.99996 reads R$ 1,00
    let mut formatted = format!("{:.4}", value.abs());
    if !formatted.starts_with("0.") {
        formatted = format!("{:.2}", value.abs());
    }
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Renders quotes as a table, one row per quote, in the order given.
pub fn quotes_table(quotes: &[Quote]) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Currency"),
        header_cell("Code"),
        header_cell("Value"),
        header_cell("Change"),
        header_cell("Updated"),
    ]);

    for quote in quotes {
        table.add_row(vec![
            Cell::new(&quote.title).add_attribute(Attribute::Bold),
            Cell::new(quote.code.as_deref().unwrap_or("-")),
            format_optional_cell(quote.current_value, format_brl),
            variation_cell(quote.variation.as_deref()),
            format_optional_cell(quote.updated.as_deref(), str::to_string),
        ]);
    }

    table.to_string()
}

/// Creates a spinner shown while quotes are being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
