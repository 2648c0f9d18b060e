//! Document extraction: uploaded file bytes → raw resume text.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// Main body part of a WordprocessingML package.
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {0} (upload a .pdf, .docx or .txt file)")]
    Unsupported(String),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read DOCX: {0}")]
    Docx(String),

    #[error("no readable text found in {0}")]
    Empty(String),
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn docx_error(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Docx(e.to_string())
}

/// Paragraph text of a `.docx` package, one line per paragraph.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(docx_error)?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(docx_error)?
        .read_to_string(&mut xml)
        .map_err(docx_error)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_run_text = false,
            Event::End(e) if e.name().as_ref() == b"w:p" => text.push('\n'),
            Event::Empty(e) if e.name().as_ref() == b"w:tab" => text.push('\t'),
            Event::Empty(e) if matches!(e.name().as_ref(), b"w:br" | b"w:cr") => text.push('\n'),
            Event::Text(t) if in_run_text => text.push_str(&t.unescape().map_err(docx_error)?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Extracts text from a `.pdf`, `.docx` or `.txt` upload. Whitespace-only output is
/// an error. Legacy binary `.doc` files are not supported.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match extension(file_name).as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        "docx" => docx_text(bytes)?,
        "txt" => String::from_utf8_lossy(bytes).into_owned(),
        _ => return Err(ExtractionError::Unsupported(file_name.to_string())),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty(file_name.to_string()));
    }

    debug!("Extracted {} chars from {}", text.len(), file_name);
    Ok(text)
}

/// Runs `extract_text` on the blocking pool. Parsing is CPU-bound and a panic
/// inside a parser surfaces as `ExtractionError::Pdf`.
pub async fn extract_text_blocking(file_name: String, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&file_name, &bytes))
        .await
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?
}

/// Minimal `.docx` package holding one paragraph per entry.
#[cfg(test)]
pub fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(DOCX_BODY, zip::write::FileOptions::default())
        .expect("start docx body");
    writer.write_all(xml.as_bytes()).expect("write docx body");
    writer.finish().expect("finish docx").into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx_fixture(&["Data analyst", "Built models with NumPy &amp; Pandas"]);
        let text = extract_text("cv.DOCX", &bytes).unwrap();
        assert_eq!(text, "Data analyst\nBuilt models with NumPy & Pandas\n");
    }

    #[test]
    fn test_docx_tabs_and_breaks() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Skills</w:t><w:tab/><w:t>Rust</w:t><w:br/><w:t>Go</w:t></w:r></w:p></w:body></w:document>"#;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCX_BODY, zip::write::FileOptions::default()).unwrap();
        std::io::Write::write_all(&mut writer, xml.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert_eq!(extract_text("cv.docx", &bytes).unwrap(), "Skills\tRust\nGo\n");
    }

    #[test]
    fn test_corrupt_docx_is_error() {
        assert!(matches!(
            extract_text("cv.docx", b"not a zip archive"),
            Err(ExtractionError::Docx(_))
        ));
    }

    #[test]
    fn test_empty_docx_is_error() {
        assert!(matches!(
            extract_text("cv.docx", &docx_fixture(&["   "])),
            Err(ExtractionError::Empty(_))
        ));
    }

    #[test]
    fn test_txt_is_read_lossy() {
        let text = extract_text("cv.TXT", b"Rust developer \xff with numpy").unwrap();
        assert!(text.starts_with("Rust developer"));
        assert!(text.ends_with("with numpy"));
    }

    #[test]
    fn test_legacy_and_unknown_types_are_unsupported() {
        for name in ["cv.doc", "cv", "cv.png"] {
            assert!(matches!(
                extract_text(name, b"anything"),
                Err(ExtractionError::Unsupported(_))
            ));
        }
    }

    #[test]
    fn test_blank_document_is_error() {
        assert!(matches!(
            extract_text("cv.txt", b" \n\t "),
            Err(ExtractionError::Empty(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_error() {
        let result = extract_text_blocking("cv.pdf".to_string(), b"not a pdf".to_vec()).await;
        assert!(result.is_err());
    }
}
