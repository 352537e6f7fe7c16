//! Request-for-quotation text generator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RfqError;

const PLACEHOLDER: &str = "—";
const PREVIEW_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfqLang {
    Ru,
    En,
    Cn,
}

impl RfqLang {
    fn code(self) -> &'static str {
        match self {
            RfqLang::Ru => "ru",
            RfqLang::En => "en",
            RfqLang::Cn => "cn",
        }
    }
}

impl std::str::FromStr for RfqLang {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ru" => Ok(RfqLang::Ru),
            "en" => Ok(RfqLang::En),
            "cn" | "zh" => Ok(RfqLang::Cn),
            _ => Err(RfqError::UnsupportedLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfqRequest {
    pub lang: RfqLang,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub moq: Option<u32>,
    #[serde(default)]
    pub incoterms: Option<String>,
    #[serde(default)]
    pub required_certs: Vec<String>,
    #[serde(default)]
    pub qty: Option<u32>,
    #[serde(default)]
    pub custom_note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RfqDocument {
    pub path: PathBuf,
    /// First lines of the rendered text, for display.
    pub preview: String,
}

struct Fields<'a> {
    title: &'a str,
    url_or_img: &'a str,
    price_range: &'a str,
    moq: String,
    incoterms: &'a str,
    certs: String,
    qty: String,
}

impl<'a> Fields<'a> {
    fn from_request(req: &'a RfqRequest) -> Self {
        let or_dash = |v: Option<&'a String>| v.map_or(PLACEHOLDER, String::as_str);
        Self {
            title: req.title.trim(),
            url_or_img: or_dash(req.url.as_ref().or(req.image_url.as_ref())),
            price_range: or_dash(req.price_range.as_ref()),
            moq: req.moq.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string()),
            incoterms: or_dash(req.incoterms.as_ref()),
            certs: if req.required_certs.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                req.required_certs.join(", ")
            },
            qty: req.qty.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string()),
        }
    }
}

/// Render the RFQ body for the request's language.
///
/// Missing optional fields print as `—`. A custom note, when present, is
/// appended after a blank line.
///
/// # Errors
///
/// Returns [`RfqError::EmptyTitle`] if the title is blank.
pub fn render_rfq(req: &RfqRequest) -> Result<String, RfqError> {
    if req.title.trim().is_empty() {
        return Err(RfqError::EmptyTitle);
    }

    let f = Fields::from_request(req);
    let mut body = match req.lang {
        RfqLang::Ru => format!(
            "Тема: Запрос коммерческого предложения (RFQ)\n\n\
             Здравствуйте!\n\n\
             Мы заинтересованы в товаре: {}.\n\
             Ссылка/фото: {}\n\
             Цена (по карточке): {}\n\
             MOQ (по карточке): {}\n\
             Условия: {}\n\
             Требуемые сертификаты: {}\n\
             Планируемый объём: {}\n\n\
             Просим прислать актуальную цену, сроки производства и логистики, варианты упаковки.\n\
             Спасибо!",
            f.title, f.url_or_img, f.price_range, f.moq, f.incoterms, f.certs, f.qty
        ),
        RfqLang::En => format!(
            "Subject: RFQ\n\n\
             Hello,\n\n\
             We are interested in: {}.\n\
             Link/photo: {}\n\
             Price (card): {}\n\
             MOQ (card): {}\n\
             Incoterms: {}\n\
             Required certificates: {}\n\
             Planned quantity: {}\n\n\
             Please provide current price, lead time, logistics options, and packaging.\n\
             Thank you.",
            f.title, f.url_or_img, f.price_range, f.moq, f.incoterms, f.certs, f.qty
        ),
        RfqLang::Cn => format!(
            "主题：询价（RFQ）\n\n\
             您好！\n\n\
             我们对以下产品感兴趣：{}。\n\
             链接/图片：{}\n\
             参考价格：{}\n\
             最小起订量：{}\n\
             贸易条款：{}\n\
             所需认证：{}\n\
             预计数量：{}\n\n\
             请提供最新价格、生产周期、物流方案以及包装信息。谢谢！",
            f.title, f.url_or_img, f.price_range, f.moq, f.incoterms, f.certs, f.qty
        ),
    };

    if let Some(note) = req.custom_note.as_deref().filter(|n| !n.trim().is_empty()) {
        body.push_str("\n\n");
        body.push_str(note);
    }

    Ok(body)
}

/// Render the RFQ and write it to `dir/rfq_{lang}.txt`.
///
/// # Errors
///
/// Returns [`RfqError::EmptyTitle`] for a blank title or [`RfqError::Io`] if
/// the file cannot be written.
pub fn generate_rfq(req: &RfqRequest, dir: &Path) -> Result<RfqDocument, RfqError> {
    let body = render_rfq(req)?;

    std::fs::create_dir_all(dir).map_err(|e| RfqError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;
    let path = dir.join(format!("rfq_{}.txt", req.lang.code()));
    std::fs::write(&path, &body).map_err(|e| RfqError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let preview = body
        .lines()
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(RfqDocument { path, preview })
}
