//! `search` command: batch (ranked) or streamed supplier search.

use cargoos_core::{export_records, AppConfig, ExportFormat, SearchMode, SearchQuery, SupplierRecord};
use cargoos_scraper::SearchPipeline;
use clap::Args;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search keywords (Chinese works best)
    pub q: String,
    /// fast | precise
    #[arg(long, default_value = "fast")]
    pub mode: SearchMode,
    /// Result pages to fetch (1-20)
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
    /// Concurrent page fetches (1-10)
    #[arg(long, default_value_t = 3)]
    pub concurrency: usize,
    /// Per-request timeout in seconds (1-60)
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,
    #[arg(long)]
    pub proxy: Option<String>,
    #[arg(long)]
    pub cookie: Option<String>,
    /// Keep resellers and trading companies
    #[arg(long)]
    pub all_suppliers: bool,
    /// Keep suppliers without an audit badge
    #[arg(long)]
    pub include_unaudited: bool,
    /// Use the saved snapshot or built-in samples instead of the network
    #[arg(long)]
    pub offline: bool,
    /// Re-fetch incomplete pages through a renderer
    #[arg(long)]
    pub render: bool,
    #[arg(long, default_value_t = 0)]
    pub min_years: u32,
    #[arg(long)]
    pub moq_max: Option<u32>,
    #[arg(long)]
    pub price_min: Option<f64>,
    #[arg(long)]
    pub price_max: Option<f64>,
    #[arg(long)]
    pub region: Option<String>,
    /// Print records as each page completes instead of one ranked list
    #[arg(long)]
    pub stream: bool,
    /// Also write the results as csv or json
    #[arg(long)]
    pub export: Option<ExportFormat>,
    /// Print JSON lines instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            q: self.q.clone(),
            mode: self.mode,
            pages: self.pages,
            concurrency: self.concurrency,
            timeout: self.timeout,
            proxy: self.proxy.clone(),
            cookie: self.cookie.clone(),
            only_factories: !self.all_suppliers,
            audited_only: !self.include_unaudited,
            online: !self.offline,
            render: self.render,
            offline_demo: self.offline,
            min_years: self.min_years,
            moq_max: self.moq_max,
            price_min: self.price_min,
            price_max: self.price_max,
            region: self.region.clone(),
        }
    }
}

/// Run a search and print the results.
///
/// Ctrl-C stops the run; pages completed so far are still printed (batch)
/// or have already been printed (stream).
///
/// # Errors
///
/// Returns an error for an invalid query, an unusable configuration, or a
/// failed export.
pub(crate) async fn run_search(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let query = args.to_query();
    query.validate()?;

    let pipeline = SearchPipeline::from_config(config)?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; finishing with completed pages");
            ctrl_c.cancel();
        }
    });

    let records = if args.stream {
        let mut stream = pipeline.search_stream(&query, cancel).await?;
        let mut seen = Vec::new();
        while let Some(record) = stream.next().await {
            print_record(&record, args.json)?;
            seen.push(record);
        }
        seen
    } else {
        let records = pipeline.search_batch(&query, cancel).await?;
        for record in &records {
            print_record(record, args.json)?;
        }
        records
    };

    if !args.json {
        println!("{} supplier(s)", records.len());
    }

    if let Some(format) = args.export {
        let path = export_records(&records, format, &config.exports_dir)?;
        println!("exported to {}", path.display());
    }

    Ok(())
}

fn print_record(record: &SupplierRecord, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
    } else {
        println!("{}", format_row(record));
    }
    Ok(())
}

/// One human-readable line per supplier.
pub(crate) fn format_row(record: &SupplierRecord) -> String {
    let price = match (record.price_min_cny, record.price_max_cny) {
        (Some(min), Some(max)) => format!("¥{min:.2}-{max:.2}"),
        (Some(min), None) => format!("¥{min:.2}"),
        _ => "-".to_string(),
    };
    let moq = record
        .moq
        .map_or_else(|| "-".to_string(), |m| m.to_string());
    let badges = match (record.is_factory, record.audited) {
        (true, true) => "factory, audited",
        (true, false) => "factory",
        (false, true) => "audited",
        (false, false) => "",
    };
    format!(
        "{score:>5.1}  {price:<16} moq {moq:<8} {title} [{badges}] {url}",
        score = record.score,
        title = record.title,
        url = record.url,
    )
}
