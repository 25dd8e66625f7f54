//! Text rendering of simulation summaries. Formatting is driven by an
//! explicit [`LocaleSpec`] argument on every call; nothing here touches
//! process-wide locale state.

use std::fmt::Write as _;

use crate::core::{
    SimulationConfig, SimulationResult, distribution_summary, percentile_table, success_rate,
    terminal_real_values,
};

/// Number and currency formatting rules for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSpec {
    pub currency_symbol: &'static str,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl LocaleSpec {
    pub const fn en_us() -> Self {
        Self {
            currency_symbol: "$",
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    pub const fn en_gb() -> Self {
        Self {
            currency_symbol: "\u{a3}",
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    pub const fn de_de() -> Self {
        Self {
            currency_symbol: "\u{20ac}",
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }
}

/// Whole-unit currency amount with thousands grouping, e.g. `$1,700,000`.
pub fn format_currency(amount: f64, locale: &LocaleSpec) -> String {
    let negative = amount < 0.0;
    let grouped = group_digits(amount.abs().round() as u128, locale.thousands_separator);
    if negative {
        format!("-{}{grouped}", locale.currency_symbol)
    } else {
        format!("{}{grouped}", locale.currency_symbol)
    }
}

/// Plain grouped integer, e.g. `100,000` simulated paths.
pub fn format_count(value: usize, locale: &LocaleSpec) -> String {
    group_digits(value as u128, locale.thousands_separator)
}

/// One-decimal percentage, e.g. `97.5%` (or `97,5%` under a comma locale).
pub fn format_percent(value: f64, locale: &LocaleSpec) -> String {
    let rendered = format!("{value:.1}");
    let localized = rendered.replace('.', &locale.decimal_separator.to_string());
    format!("{localized}%")
}

fn group_digits(value: u128, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Renders the full text report: run parameters, success rate, nominal and
/// real terminal summaries, and the percentile table.
pub fn render_text_report(
    config: &SimulationConfig,
    result: &SimulationResult,
    locale: &LocaleSpec,
) -> String {
    let nominal = distribution_summary(result.terminal_values());
    let real_values = terminal_real_values(result);
    let real = distribution_summary(&real_values);
    let table = percentile_table(result);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Retirement portfolio simulation: {} years, {} paths",
        result.years(),
        format_count(result.paths(), locale)
    );
    let _ = writeln!(
        out,
        "Initial investment: {}",
        format_currency(config.initial_investment, locale)
    );
    let _ = writeln!(
        out,
        "Initial annual withdrawal: {}",
        format_currency(config.initial_withdrawal, locale)
    );
    let _ = writeln!(
        out,
        "Success rate: {}",
        format_percent(success_rate(result), locale)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Terminal value (nominal): mean {}, median {}",
        format_currency(nominal.mean, locale),
        format_currency(nominal.median, locale)
    );
    let _ = writeln!(
        out,
        "Terminal value (real):    mean {}, median {}",
        format_currency(real.mean, locale),
        format_currency(real.median, locale)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>10}  {:>18}  {:>18}", "Percentile", "Nominal", "Real");
    for row in &table {
        let _ = writeln!(
            out,
            "{:>10}  {:>18}  {:>18}",
            format!("{}th", row.rank),
            format_currency(row.nominal, locale),
            format_currency(row.real, locale)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SeededNormal, run_simulation};

    #[test]
    fn currency_grouping_under_us_locale() {
        let locale = LocaleSpec::en_us();
        assert_eq!(format_currency(0.0, &locale), "$0");
        assert_eq!(format_currency(950.4, &locale), "$950");
        assert_eq!(format_currency(1_700_000.0, &locale), "$1,700,000");
        assert_eq!(format_currency(-12_345.6, &locale), "-$12,346");
    }

    #[test]
    fn currency_grouping_under_german_locale() {
        let locale = LocaleSpec::de_de();
        assert_eq!(format_currency(1_234_567.0, &locale), "\u{20ac}1.234.567");
        assert_eq!(format_percent(97.53, &locale), "97,5%");
    }

    #[test]
    fn counts_group_without_a_symbol() {
        assert_eq!(format_count(100_000, &LocaleSpec::en_us()), "100,000");
        assert_eq!(format_count(999, &LocaleSpec::en_us()), "999");
    }

    #[test]
    fn report_contains_headline_figures_and_every_rank() {
        let config = SimulationConfig {
            initial_investment: 100_000.0,
            returns_mean: 0.0,
            returns_std: 0.0,
            years: 3,
            paths: 1,
            initial_withdrawal: 10_000.0,
            inflation_mean: 0.0,
            inflation_std: 0.0,
        };
        let mut source = SeededNormal::from_seed(1);
        let result = run_simulation(&config, &mut source).unwrap();
        let report = render_text_report(&config, &result, &LocaleSpec::en_us());

        assert!(report.contains("3 years, 1 paths"));
        assert!(report.contains("Initial investment: $100,000"));
        assert!(report.contains("Initial annual withdrawal: $10,000"));
        assert!(report.contains("Success rate: 100.0%"));
        // Deterministic run ends at exactly 80,000 nominal and real.
        assert!(report.contains("mean $80,000, median $80,000"));
        for rank in [5, 50, 95] {
            assert!(report.contains(&format!("{rank}th")));
        }
    }
}
