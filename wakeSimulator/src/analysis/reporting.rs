use super::aggregation::AggregatedMetrics;
use super::metrics_calculation::FarmMetrics;

/// Format with thousands separators and a fixed number of decimals.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (n, ch) in int_part.chars().enumerate() {
        if n > 0 && (int_part.len() - n) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn print_metrics_summary(metrics: &FarmMetrics, aggregated: &AggregatedMetrics) {
    println!("AEP [GWh]: {}", format_thousands(metrics.total_aep(), 3));
    if let Some(lcoe) = aggregated.lcoe_overall {
        println!("LCoE [USD/MWh]: {}", format_thousands(lcoe, 3));
    }
    if let Some(cap_fac) = aggregated.cap_fac_overall {
        println!("Capacity factor [%]: {}", format_thousands(100.0 * cap_fac, 3));
    }
}

pub fn print_direction_table(label: &str, metrics: &FarmMetrics, aggregated: &AggregatedMetrics) {
    println!("\n{} by direction", label);
    println!("----------------------------------------");
    println!("{:>8} {:>12} {:>14} {:>10}", "wd [deg]", "AEP [GWh]", "LCoE [USD/MWh]", "CF [%]");
    let aep_by_direction = metrics.aep.nansum_turbines();
    for (l, wd) in metrics.wd.iter().enumerate() {
        let lcoe = aggregated.lcoe_direction.as_ref().map_or(f64::NAN, |v| v[l]);
        let cap_fac = aggregated.cap_fac_direction.as_ref().map_or(f64::NAN, |v| v[l]);
        println!("{:>8.1} {:>12.3} {:>14.3} {:>10.3}", wd, aep_by_direction[l], lcoe, 100.0 * cap_fac);
    }
    println!("----------------------------------------");
}
