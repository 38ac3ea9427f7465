//! Plain text of a metadata document: `.docx` bodies or text files.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

const DOCX_BODY: &str = "word/document.xml";

pub fn read_document_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let is_docx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("docx"))
        .unwrap_or(false);
    if is_docx {
        let xml = read_docx_body(path)?;
        docx_text(&xml)
    } else {
        fs::read_to_string(path).map_err(|err| Error::io(path, err))
    }
}

fn read_docx_body(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|err| Error::io(path, err))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|err| Error::Document(format!("{}: {err}", path.display())))?;
    let mut body = archive
        .by_name(DOCX_BODY)
        .map_err(|err| Error::Document(format!("{}: {DOCX_BODY}: {err}", path.display())))?;
    let mut xml = String::new();
    body.read_to_string(&mut xml)
        .map_err(|err| Error::io(path, err))?;
    Ok(xml)
}

/// Paragraph texts joined by newlines; runs within a paragraph are
/// concatenated, tabs and line breaks kept.
pub fn docx_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| Error::Document(format!("document.xml: {err}")))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|err| Error::Document(format!("document.xml: {err}")))?;
                current.push_str(&text);
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let text = paragraphs.join("\n");
    Ok(text.trim().to_string())
}
