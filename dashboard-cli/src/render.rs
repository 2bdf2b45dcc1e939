use dashboard_core::view::{
    AirQualityPanel, CurrentConditionsView, DashboardView, ForecastRowView, IconView,
};

/// Plain-text rendering of a dashboard view.
pub fn dashboard(view: &DashboardView) -> String {
    match view {
        DashboardView::Empty => "No weather data available\n".to_string(),
        DashboardView::Loading => "Loading…\n".to_string(),
        DashboardView::Error { message, can_retry } => {
            let mut out = format!("Error loading data\n  {message}\n");
            if *can_retry {
                out.push_str(
                    "  Run the command again, or choose \"Refresh / retry\" in interactive mode\n",
                );
            }
            out
        }
        DashboardView::Ready {
            current,
            forecast,
            air_quality,
        } => {
            let mut out = current_conditions(current);
            if let Some(panel) = air_quality {
                out.push('\n');
                out.push_str(&air_quality_panel(panel));
            }
            if !forecast.is_empty() {
                out.push('\n');
                out.push_str(&forecast_rows(forecast));
            }
            out
        }
    }
}

fn icon(view: &IconView) -> &str {
    match view {
        IconView::Glyph(glyph) => glyph,
        IconView::Image { url, .. } => url,
    }
}

fn current_conditions(view: &CurrentConditionsView) -> String {
    format!(
        "{}\n  {}{}  {}  {}\n  Humidity {}   Wind {}\n",
        view.heading,
        view.temperature,
        view.unit,
        view.description,
        icon(&view.icon),
        view.humidity,
        view.wind_speed
    )
}

fn air_quality_panel(panel: &AirQualityPanel) -> String {
    let readings: Vec<String> = panel
        .pollutants
        .iter()
        .map(|p| format!("{} {}", p.name, p.value))
        .collect();
    format!(
        "Air Quality Index {} ({}, {} {})\n  {}\n",
        panel.aqi,
        panel.category,
        panel.tier.range(),
        panel.tier.color(),
        readings.join("  ")
    )
}

fn forecast_rows(rows: &[ForecastRowView]) -> String {
    let mut out = format!("{}-Day Forecast\n", rows.len());
    for row in rows {
        out.push_str(&format!(
            "  {:<10} {:>4}/{:<4}{}  {}  {}\n",
            row.label,
            row.high,
            row.low,
            row.unit,
            row.description,
            icon(&row.icon)
        ));
    }
    out
}
