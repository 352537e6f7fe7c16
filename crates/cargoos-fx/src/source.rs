//! Remote rate sources.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, Url};
use rust_decimal::Decimal;

use crate::error::FxError;

pub const DEFAULT_CBR_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

const CNY_CODE: &str = "CNY";

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current value of one CNY in the target currency.
    async fn fetch_rate(&self) -> Result<Decimal, FxError>;
}

/// Central Bank of Russia daily rates (CNY -> RUB).
pub struct CbrRateSource {
    client: Client,
    url: Url,
}

impl CbrRateSource {
    /// # Errors
    ///
    /// Returns [`FxError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, FxError> {
        Self::with_url(DEFAULT_CBR_URL, timeout_secs)
    }

    /// Source reading the feed at `url` (a mock server in tests).
    ///
    /// # Errors
    ///
    /// Returns [`FxError::Http`] if the HTTP client cannot be built, or
    /// [`FxError::InvalidSourceUrl`] if `url` does not parse.
    pub fn with_url(url: &str, timeout_secs: u64) -> Result<Self, FxError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cargoos/0.1 (fx)")
            .build()?;
        let url = Url::parse(url).map_err(|e| FxError::InvalidSourceUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl RateSource for CbrRateSource {
    async fn fetch_rate(&self) -> Result<Decimal, FxError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FxError::UpstreamStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        // The feed is windows-1251; the fields read here are ASCII.
        let bytes = response.bytes().await?;
        let xml = String::from_utf8_lossy(&bytes);
        let rate = parse_cbr_rate(&xml, CNY_CODE)?;
        tracing::info!(rate = %rate, "fetched CBR CNY rate");
        Ok(rate)
    }
}

/// Rate for `char_code` from a CBR `ValCurs` document: `Value / Nominal`.
///
/// `Value` uses a decimal comma (`"12,3456"`).
///
/// # Errors
///
/// Returns [`FxError::Xml`] for malformed XML, or [`FxError::Parse`] when
/// the currency is missing or its numbers are unusable.
pub fn parse_cbr_rate(xml: &str, char_code: &str) -> Result<Decimal, FxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current_tag = String::new();
    let mut code = String::new();
    let mut nominal = String::new();
    let mut value = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "Valute" {
                    code.clear();
                    nominal.clear();
                    value.clear();
                }
                current_tag = name;
            }
            Event::Text(e) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                match current_tag.as_str() {
                    "CharCode" => code = text,
                    "Nominal" => nominal = text,
                    "Value" => value = text,
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"Valute" && code == char_code {
                    return rate_from_parts(char_code, &nominal, &value);
                }
                current_tag.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(FxError::Parse(format!("{char_code} not found in CBR feed")))
}

fn rate_from_parts(char_code: &str, nominal: &str, value: &str) -> Result<Decimal, FxError> {
    let value = Decimal::from_str(&value.replace(',', "."))
        .map_err(|e| FxError::Parse(format!("{char_code} value '{value}': {e}")))?;
    let nominal = Decimal::from_str(nominal)
        .map_err(|e| FxError::Parse(format!("{char_code} nominal '{nominal}': {e}")))?;
    if nominal <= Decimal::ZERO {
        return Err(FxError::Parse(format!("{char_code} nominal must be positive")));
    }
    let rate = value / nominal;
    if rate <= Decimal::ZERO {
        return Err(FxError::Parse(format!("{char_code} rate must be positive")));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="17.10.2026" name="Foreign Currency Market">
  <Valute ID="R01235">
    <NumCode>840</NumCode>
    <CharCode>USD</CharCode>
    <Nominal>1</Nominal>
    <Name>US Dollar</Name>
    <Value>81,2500</Value>
  </Valute>
  <Valute ID="R01375">
    <NumCode>156</NumCode>
    <CharCode>CNY</CharCode>
    <Nominal>10</Nominal>
    <Name>Yuan</Name>
    <Value>112,3450</Value>
  </Valute>
</ValCurs>"#;

    #[test]
    fn parses_cny_with_nominal_and_decimal_comma() {
        let rate = parse_cbr_rate(FEED, "CNY").expect("rate");
        assert_eq!(rate, Decimal::from_str("11.2345").expect("decimal"));
    }

    #[test]
    fn reads_the_requested_currency_only() {
        let rate = parse_cbr_rate(FEED, "USD").expect("rate");
        assert_eq!(rate, Decimal::from_str("81.25").expect("decimal"));
    }

    #[test]
    fn missing_currency_is_a_parse_error() {
        let result = parse_cbr_rate(FEED, "EUR");
        assert!(matches!(result, Err(FxError::Parse(_))));
    }

    #[test]
    fn garbage_value_is_a_parse_error() {
        let feed = FEED.replace("112,3450", "n/a");
        assert!(matches!(parse_cbr_rate(&feed, "CNY"), Err(FxError::Parse(_))));
    }

    #[test]
    fn zero_nominal_is_rejected() {
        let feed = FEED.replace("<Nominal>10</Nominal>", "<Nominal>0</Nominal>");
        assert!(matches!(parse_cbr_rate(&feed, "CNY"), Err(FxError::Parse(_))));
    }

    #[test]
    fn non_xml_body_yields_no_rate() {
        assert!(parse_cbr_rate("<html><body>maintenance</body></html>", "CNY").is_err());
    }
}
