use super::ui;
use crate::core::{RateQuote, RateResponse, format_indian_rate, get_rate_trend};
use crate::service::RateService;
use anyhow::Result;
use comfy_table::Cell;

impl RateResponse {
    /// Renders the quote as a table, with the trend against `previous` when known.
    pub fn display_as_table(&self, previous: Option<&RateQuote>) -> String {
        let quote = &self.data;
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Metal"),
            ui::header_cell("Rate (₹/g)"),
            ui::header_cell("10 g"),
            ui::header_cell("Trend"),
        ]);

        let rows = [
            ("Gold 24K", quote.gold_rate, previous.map(|p| p.gold_rate)),
            ("Silver", quote.silver_rate, previous.map(|p| p.silver_rate)),
        ];
        for (metal, rate, prev) in rows {
            table.add_row(vec![
                Cell::new(metal),
                ui::amount_cell(format_indian_rate(rate)),
                ui::amount_cell(format_indian_rate(rate * 10.0)),
                ui::trend_cell(prev.map(|p| get_rate_trend(rate, p))),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Live Metal Rates", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}\n{} {}",
            ui::style_text("Source:", ui::StyleType::Label),
            quote.source,
            ui::style_text("As of:", ui::StyleType::Label),
            quote.timestamp
        ));
        if let Some(note) = &quote.note {
            output.push_str(&format!("\n{}", ui::style_text(note, ui::StyleType::Subtle)));
        }
        if let Some(error) = &self.error {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(&format!("⚠ {error}"), ui::StyleType::Warning)
            ));
        }
        output
    }
}

/// Fetches current rates along with the quote they replace, read before the
/// fetch can clear an expired entry.
async fn fetch_with_previous(service: &RateService) -> (RateResponse, Option<RateQuote>) {
    let previous = service.last_cached_rates().await;
    let response = service.fetch_live_metal_rates().await;
    (response, previous)
}

pub async fn run(service: &RateService, json: bool) -> Result<()> {
    let pb = ui::new_spinner("Fetching metal rates...");
    let (response, previous) = fetch_with_previous(service).await;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.display_as_table(previous.as_ref()));
    }
    Ok(())
}
