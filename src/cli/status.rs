use super::ui;
use crate::core::format_indian_rate;
use crate::service::{RateService, ScheduleStatus};
use anyhow::{Result, bail};
use comfy_table::Cell;

impl ScheduleStatus {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Item"), ui::header_cell("Value")]);

        let last_call = self
            .usage
            .last_call
            .map_or("never".to_string(), |t| t.format("%d %b %H:%M").to_string());
        let cached = self.cached.as_ref().map_or("none".to_string(), |q| {
            format!("{} gold, {}", format_indian_rate(q.gold_rate), q.source)
        });

        table.add_row(vec![
            Cell::new("Now"),
            Cell::new(self.now.format("%d %b %Y %H:%M").to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Live updates today"),
            Cell::new(format!("{}/{}", self.usage.count, self.max_daily_requests)),
        ]);
        table.add_row(vec![Cell::new("Last live update"), Cell::new(last_call)]);
        table.add_row(vec![
            Cell::new("Live update now"),
            Cell::new(self.decision.to_string()),
        ]);
        table.add_row(vec![Cell::new("Cached rates"), Cell::new(cached)]);

        format!(
            "{}\n\n{}",
            ui::style_text("Rate Schedule", ui::StyleType::Title),
            table
        )
    }
}

pub async fn run(service: &RateService) -> Result<()> {
    let status = service.schedule_status().await;
    println!("{}", status.display_as_table());
    Ok(())
}

pub async fn clear_cache(service: &RateService) -> Result<()> {
    if !service.clear_cached_rates().await {
        bail!("Failed to clear cached rates");
    }
    tracing::info!("Cleared cached rates");
    println!("Cached rates cleared.");
    Ok(())
}
