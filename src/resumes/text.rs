use anyhow::Context;
use bytes::Bytes;

/// Plain text is taken as-is; everything else is treated as a PDF.
pub async fn extract_resume_text(content_type: &str, data: Bytes) -> anyhow::Result<String> {
    if is_plain_text(content_type) {
        return String::from_utf8(data.to_vec()).context("resume is not valid UTF-8");
    }

    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&data)
            .map_err(|e| anyhow::anyhow!("extract pdf text: {e}"))
    })
    .await
    .context("pdf extraction task")?
}

fn is_plain_text(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false)
}
