use async_trait::async_trait;

use crate::pads::PadRepository;

/// Renders a pad as a standalone HTML document.
#[async_trait]
pub trait HtmlExporter: Send + Sync {
    /// `None` when the pad does not exist.
    async fn render(&self, pad_id: &str) -> anyhow::Result<Option<String>>;
}

/// Escaped plain text, one `<br>` per line break.
pub struct PlainHtmlExporter {
    pads: PadRepository,
}

impl PlainHtmlExporter {
    pub fn new(pads: PadRepository) -> Self {
        Self { pads }
    }
}

#[async_trait]
impl HtmlExporter for PlainHtmlExporter {
    async fn render(&self, pad_id: &str) -> anyhow::Result<Option<String>> {
        let Some(doc) = self.pads.load(pad_id).await? else {
            return Ok(None);
        };
        let mut html = String::with_capacity(doc.text.len() + 128);
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>");
        push_escaped(&mut html, pad_id);
        html.push_str("</title>\n</head>\n<body>\n");
        for (i, line) in doc.text.lines().enumerate() {
            if i > 0 {
                html.push_str("<br>\n");
            }
            push_escaped(&mut html, line);
        }
        html.push_str("\n</body>\n</html>\n");
        Ok(Some(html))
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}
