// Document Loader
// Extracts plain text from .txt, .docx and .pdf inputs

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("docx archive has no word/document.xml")]
    MissingDocumentXml,
    #[error("Malformed docx XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Kind from the file extension; files without one are read as text.
    pub fn from_name(file_name: &str) -> Result<Self, DocumentError> {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            None | Some("txt") | Some("text") | Some("md") => Ok(DocumentKind::Text),
            Some("docx") => Ok(DocumentKind::Docx),
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some(other) => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Character a run-level WordprocessingML element stands for.
fn run_mark(local_name: &[u8]) -> Option<char> {
    match local_name {
        b"tab" => Some('\t'),
        b"br" | b"cr" => Some('\n'),
        b"noBreakHyphen" => Some('-'),
        _ => None,
    }
}

/// Paragraph text of a WordprocessingML body, one paragraph per line.
///
/// Only `w:t` content inside runs is kept; tabs and breaks inside runs map to
/// whitespace so neighbouring words never merge.
pub fn docx_xml_to_text(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::with_capacity(xml.len() / 4);
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_text = true,
                name if run_depth > 0 => out.extend(run_mark(name)),
                _ => {}
            },
            Event::Empty(e) if run_depth > 0 => out.extend(run_mark(e.local_name().as_ref())),
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

pub fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|_| DocumentError::MissingDocumentXml)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).map_err(|e| DocumentError::Io {
        path: "word/document.xml".to_string(),
        source: e,
    })?;
    docx_xml_to_text(&xml)
}

pub fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
}

pub fn extract_plain(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Extract text from in-memory file content, dispatching on the file name.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    match DocumentKind::from_name(file_name)? {
        DocumentKind::Text => Ok(extract_plain(bytes)),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Pdf => extract_pdf(bytes),
    }
}

pub fn load_document(path: &Path) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path).map_err(|e| DocumentError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    extract_text(&name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(DocumentKind::from_name("essay.TXT").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_name("essay").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_name("a.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_name("a.pdf").unwrap(), DocumentKind::Pdf);
        assert!(matches!(
            DocumentKind::from_name("a.xlsx"),
            Err(DocumentError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_docx_xml_paragraphs() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>First </w:t></w:r><w:r><w:t xml:space="preserve">paragraph.</w:t></w:r></w:p>
            <w:p><w:r><w:t>Tom &amp; Jerry&#8217;s</w:t><w:tab/><w:t>end</w:t></w:r></w:p>
            </w:body></w:document>"#;
        assert_eq!(
            docx_xml_to_text(xml).unwrap(),
            "First paragraph.\nTom & Jerry\u{2019}s\tend"
        );
    }

    #[test]
    fn test_docx_run_breaks_keep_words_apart() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>foo</w:t><w:cr/><w:t>bar</w:t><w:noBreakHyphen/><w:t>baz</w:t>\
             <w:br w:type=\"line\"/><w:t>qux</w:t><w:tab w:val=\"left\"/><w:t>end</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_text("a.docx", &bytes).unwrap(),
            "foo\nbar-baz\nqux\tend"
        );
    }

    #[test]
    fn test_docx_ignores_markup_outside_runs() {
        let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:instrText>PAGE</w:instrText><w:t>Body</w:t></w:r></w:p>"#;
        assert_eq!(docx_xml_to_text(xml).unwrap(), "Body");
    }

    #[test]
    fn test_malformed_docx_xml_is_an_error() {
        let bytes = docx_bytes("<w:p><w:r><w:t>open</w:r></w:p>");
        assert!(matches!(extract_docx(&bytes), Err(DocumentError::Xml(_))));
    }

    #[test]
    fn test_extract_docx_archive() {
        let bytes = docx_bytes("<w:p><w:r><w:t>Hello docx</w:t></w:r></w:p>");
        assert_eq!(extract_text("doc.docx", &bytes).unwrap(), "Hello docx");
    }

    #[test]
    fn test_docx_without_body_is_rejected() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(extract_docx(&buf), Err(DocumentError::MissingDocumentXml)));
        assert!(matches!(extract_docx(b"not a zip"), Err(DocumentError::Zip(_))));
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let bytes = b"\xEF\xBB\xBFplain words";
        assert_eq!(extract_text("a.txt", bytes).unwrap(), "plain words");
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        assert!(matches!(extract_pdf(b"%PDF-garbage"), Err(DocumentError::Pdf(_))));
    }

    #[test]
    fn test_load_document_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "on disk").unwrap();
        assert_eq!(load_document(&path).unwrap(), "on disk");
        assert!(matches!(
            load_document(&dir.path().join("missing.txt")),
            Err(DocumentError::Io { .. })
        ));
    }
}
