//! `rfq` command.

use cargoos_core::{generate_rfq, AppConfig, RfqLang, RfqRequest};
use clap::Args;

#[derive(Debug, Args)]
pub struct RfqArgs {
    /// ru | en | cn
    #[arg(long, default_value = "ru")]
    pub lang: RfqLang,
    /// Product title as shown on the listing
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    /// Price range as quoted, e.g. "12.5-18 CNY"
    #[arg(long)]
    pub price_range: Option<String>,
    #[arg(long)]
    pub moq: Option<u32>,
    #[arg(long)]
    pub incoterms: Option<String>,
    /// Required certificate; repeat for several
    #[arg(long = "cert")]
    pub required_certs: Vec<String>,
    #[arg(long)]
    pub qty: Option<u32>,
    #[arg(long)]
    pub note: Option<String>,
}

impl RfqArgs {
    pub fn to_request(&self) -> RfqRequest {
        RfqRequest {
            lang: self.lang,
            title: self.title.clone(),
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            price_range: self.price_range.clone(),
            moq: self.moq,
            incoterms: self.incoterms.clone(),
            required_certs: self.required_certs.clone(),
            qty: self.qty,
            custom_note: self.note.clone(),
        }
    }
}

/// Write the RFQ into the exports directory and print its preview.
///
/// # Errors
///
/// Returns an error for a blank title or when the file cannot be written.
pub(crate) fn run_rfq(config: &AppConfig, args: &RfqArgs) -> anyhow::Result<()> {
    let document = generate_rfq(&args.to_request(), &config.exports_dir)?;
    tracing::info!(path = %document.path.display(), "RFQ written");
    println!("{}", document.preview);
    println!("\nsaved to {}", document.path.display());
    Ok(())
}
