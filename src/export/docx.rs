//! Markdown to DOCX renderer.
//!
//! Builds the OOXML package directly: content types, relationships,
//! styles, header and footer parts, and the document body assembled from
//! parsed markdown blocks. Output is A4 with a branded cover page and a
//! page-number footer field.

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

const BRAND_PRIMARY: &str = "1A56DB";
const BRAND_SECONDARY: &str = "2D3A4A";
const BRAND_TEXT: &str = "333333";
const MUTED_DATE: &str = "999999";
const MUTED_NOTICE: &str = "BBBBBB";
const MUTED_CHROME: &str = "AAAAAA";

static RULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-{3,}|\*{3,})$").unwrap());
static TABLE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|[-\s|:]+\|$").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*]\s+").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+").unwrap());
static HEADING_EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[📄📋📅💰📌⚠️🚀✅📊📝🔍📂🛠️]+\s*").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*]+\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]+\*").unwrap());

// ── Markdown model ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    bold: bool,
    italic: bool,
}

#[derive(Debug, PartialEq)]
enum Block {
    Heading { level: u8, text: String },
    Paragraph(Vec<Run>),
    Bullet(Vec<Run>),
    Numbered { number: String, runs: Vec<Run> },
    Table(Vec<Vec<Vec<Run>>>),
}

fn strip_heading_emoji(text: &str) -> String {
    HEADING_EMOJI_RE.replace(text, "").trim().to_string()
}

/// Inline markdown into styled runs. Bold spans first, italics inside
/// the remainder.
fn parse_inline(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    for m in BOLD_RE.find_iter(text) {
        if m.start() > cursor {
            parse_italic(&text[cursor..m.start()], &mut runs);
        }
        let inner = &m.as_str()[2..m.as_str().len() - 2];
        runs.push(Run {
            text: inner.to_string(),
            bold: true,
            italic: false,
        });
        cursor = m.end();
    }
    if cursor < text.len() {
        parse_italic(&text[cursor..], &mut runs);
    }
    runs
}

fn parse_italic(text: &str, runs: &mut Vec<Run>) {
    let mut cursor = 0;
    for m in ITALIC_RE.find_iter(text) {
        if m.start() > cursor {
            push_plain(&text[cursor..m.start()], runs);
        }
        let inner = &m.as_str()[1..m.as_str().len() - 1];
        runs.push(Run {
            text: inner.to_string(),
            bold: false,
            italic: true,
        });
        cursor = m.end();
    }
    if cursor < text.len() {
        push_plain(&text[cursor..], runs);
    }
}

fn push_plain(text: &str, runs: &mut Vec<Run>) {
    if !text.is_empty() {
        runs.push(Run {
            text: text.to_string(),
            bold: false,
            italic: false,
        });
    }
}

fn parse_table_row(line: &str) -> Vec<Vec<Run>> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| parse_inline(&strip_heading_emoji(cell.trim())))
        .collect()
}

fn parse_markdown(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut table_rows: Vec<Vec<Vec<Run>>> = Vec::new();
    let mut in_table = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if RULE_RE.is_match(trimmed) {
            i += 1;
            continue;
        }
        if trimmed.starts_with("*Generated:") || trimmed.starts_with("_Generated:") {
            i += 1;
            continue;
        }

        if !in_table && line.contains('|') {
            let next_is_separator = lines
                .get(i + 1)
                .map(|next| TABLE_SEPARATOR_RE.is_match(next.trim()))
                .unwrap_or(false);
            if next_is_separator {
                in_table = true;
                table_rows = vec![parse_table_row(line)];
                i += 1;
                continue;
            }
        }

        if in_table {
            if line.contains('|') {
                if !TABLE_SEPARATOR_RE.is_match(trimmed) {
                    table_rows.push(parse_table_row(line));
                }
                i += 1;
                continue;
            }
            blocks.push(Block::Table(std::mem::take(&mut table_rows)));
            in_table = false;
            // Fall through to process the current line.
        }

        if let Some(rest) = line.strip_prefix("### ") {
            blocks.push(Block::Heading {
                level: 3,
                text: strip_heading_emoji(rest.trim()),
            });
        } else if let Some(rest) = line.strip_prefix("## ") {
            blocks.push(Block::Heading {
                level: 2,
                text: strip_heading_emoji(rest.trim()),
            });
        } else if let Some(rest) = line.strip_prefix("# ") {
            blocks.push(Block::Heading {
                level: 1,
                text: strip_heading_emoji(rest.trim()),
            });
        } else if BULLET_RE.is_match(line) {
            let text = BULLET_RE.replace(line, "").to_string();
            blocks.push(Block::Bullet(parse_inline(text.trim())));
        } else if let Some(captures) = NUMBERED_RE.captures(line) {
            let number = captures[1].to_string();
            let text = NUMBERED_RE.replace(line, "").to_string();
            blocks.push(Block::Numbered {
                number,
                runs: parse_inline(text.trim()),
            });
        } else if !trimmed.is_empty() {
            blocks.push(Block::Paragraph(parse_inline(trimmed)));
        }

        i += 1;
    }

    if in_table && !table_rows.is_empty() {
        blocks.push(Block::Table(table_rows));
    }

    blocks
}

// ── XML rendering ──────────────────────────────────────────────────

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn run_xml(run: &Run, half_points: Option<u32>, color: Option<&str>) -> String {
    let mut props = String::new();
    if run.bold {
        props.push_str("<w:b/>");
    }
    if run.italic {
        props.push_str("<w:i/>");
    }
    if let Some(sz) = half_points {
        props.push_str(&format!("<w:sz w:val=\"{sz}\"/>"));
    }
    if let Some(c) = color {
        props.push_str(&format!("<w:color w:val=\"{c}\"/>"));
    }
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{props}</w:rPr>")
    };
    format!(
        "<w:r>{rpr}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        escape_xml(&run.text)
    )
}

fn styled_text(
    text: &str,
    half_points: u32,
    color: &str,
    bold: bool,
    italic: bool,
    centered: bool,
) -> String {
    let run = Run {
        text: text.to_string(),
        bold,
        italic,
    };
    let jc = if centered {
        "<w:pPr><w:jc w:val=\"center\"/></w:pPr>"
    } else {
        ""
    };
    format!("<w:p>{jc}{}</w:p>", run_xml(&run, Some(half_points), Some(color)))
}

fn empty_paragraph() -> String {
    "<w:p/>".to_string()
}

fn heading_xml(level: u8, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"Heading{level}\"/></w:pPr>{}</w:p>",
        run_xml(
            &Run {
                text: text.to_string(),
                bold: false,
                italic: false
            },
            None,
            None
        )
    )
}

fn runs_xml(runs: &[Run]) -> String {
    runs.iter().map(|r| run_xml(r, None, None)).collect()
}

fn list_paragraph_xml(prefix: &str, runs: &[Run]) -> String {
    let marker = Run {
        text: prefix.to_string(),
        bold: false,
        italic: false,
    };
    format!(
        "<w:p><w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr>{}{}</w:p>",
        run_xml(&marker, None, None),
        runs_xml(runs)
    )
}

fn table_xml(rows: &[Vec<Vec<Run>>]) -> String {
    let num_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    if num_cols == 0 {
        return String::new();
    }

    let mut xml = String::from(
        "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:jc w:val=\"center\"/>\
         <w:tblBorders>\
         <w:top w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         <w:left w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         <w:bottom w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         <w:right w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         <w:insideH w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         <w:insideV w:val=\"single\" w:sz=\"4\" w:color=\"1A56DB\"/>\
         </w:tblBorders></w:tblPr>",
    );
    for (row_idx, row) in rows.iter().enumerate() {
        xml.push_str("<w:tr>");
        for col_idx in 0..num_cols {
            let empty = Vec::new();
            let cell = row.get(col_idx).unwrap_or(&empty);
            let runs: Vec<Run> = cell
                .iter()
                .map(|r| Run {
                    text: r.text.clone(),
                    // Header row is forced bold.
                    bold: r.bold || row_idx == 0,
                    italic: r.italic,
                })
                .collect();
            let content = if runs.is_empty() {
                empty_paragraph()
            } else {
                format!("<w:p>{}</w:p>", runs_xml(&runs))
            };
            xml.push_str(&format!("<w:tc><w:tcPr/>{}</w:tc>", content));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml.push_str(&empty_paragraph());
    xml
}

fn cover_page_xml(client_name: &str, project_title: &str, company_name: &str) -> String {
    let mut xml = String::new();
    for _ in 0..6 {
        xml.push_str(&empty_paragraph());
    }
    xml.push_str(&styled_text(
        &company_name.to_uppercase(),
        28,
        BRAND_PRIMARY,
        true,
        false,
        true,
    ));
    xml.push_str(&styled_text(
        &"━".repeat(40),
        24,
        BRAND_PRIMARY,
        false,
        false,
        true,
    ));
    xml.push_str(&styled_text(project_title, 56, BRAND_SECONDARY, true, false, true));
    xml.push_str(&styled_text(
        &format!("Prepared for: {client_name}"),
        32,
        BRAND_TEXT,
        false,
        false,
        true,
    ));
    xml.push_str(&styled_text(
        &Local::now().format("%B %d, %Y").to_string(),
        24,
        MUTED_DATE,
        false,
        false,
        true,
    ));
    for _ in 0..4 {
        xml.push_str(&empty_paragraph());
    }
    xml.push_str(&styled_text("CONFIDENTIAL", 20, MUTED_NOTICE, false, true, true));
    xml.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
    xml
}

fn document_xml(markdown: &str, client_name: &str, project_title: &str, company_name: &str) -> String {
    let mut body = cover_page_xml(client_name, project_title, company_name);
    for block in parse_markdown(markdown) {
        match block {
            Block::Heading { level, text } => body.push_str(&heading_xml(level, &text)),
            Block::Paragraph(runs) => body.push_str(&format!("<w:p>{}</w:p>", runs_xml(&runs))),
            Block::Bullet(runs) => body.push_str(&list_paragraph_xml("• ", &runs)),
            Block::Numbered { number, runs } => {
                body.push_str(&list_paragraph_xml(&format!("{number}. "), &runs))
            }
            Block::Table(rows) => body.push_str(&table_xml(&rows)),
        }
    }

    // A4 with 2.5cm margins, header and footer wired on the section.
    let section = "<w:sectPr>\
        <w:headerReference w:type=\"default\" r:id=\"rIdHeader\"/>\
        <w:footerReference w:type=\"default\" r:id=\"rIdFooter\"/>\
        <w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
        <w:pgMar w:top=\"1417\" w:right=\"1417\" w:bottom=\"1417\" w:left=\"1417\" \
         w:header=\"708\" w:footer=\"708\"/>\
        </w:sectPr>";

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <w:body>{body}{section}</w:body></w:document>"
    )
}

fn styles_xml() -> String {
    fn heading_style(id: &str, name: &str, half_points: u32, color: &str, before: u32, after: u32) -> String {
        format!(
            "<w:style w:type=\"paragraph\" w:styleId=\"{id}\">\
             <w:name w:val=\"{name}\"/><w:basedOn w:val=\"Normal\"/>\
             <w:pPr><w:spacing w:before=\"{before}\" w:after=\"{after}\"/></w:pPr>\
             <w:rPr><w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\"/><w:b/>\
             <w:sz w:val=\"{half_points}\"/><w:color w:val=\"{color}\"/></w:rPr></w:style>"
        )
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\">\
         <w:name w:val=\"Normal\"/>\
         <w:pPr><w:spacing w:after=\"120\" w:line=\"276\" w:lineRule=\"auto\"/></w:pPr>\
         <w:rPr><w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\"/>\
         <w:sz w:val=\"22\"/><w:color w:val=\"{BRAND_TEXT}\"/></w:rPr></w:style>\
         {h1}{h2}{h3}</w:styles>",
        h1 = heading_style("Heading1", "heading 1", 44, BRAND_PRIMARY, 480, 240),
        h2 = heading_style("Heading2", "heading 2", 32, BRAND_SECONDARY, 360, 160),
        h3 = heading_style("Heading3", "heading 3", 26, BRAND_SECONDARY, 240, 120),
    )
}

fn header_xml(company_name: &str, client_name: &str) -> String {
    let run = Run {
        text: format!("{company_name} — Proposal for {client_name}"),
        bold: false,
        italic: false,
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:hdr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:p><w:pPr><w:jc w:val=\"right\"/></w:pPr>{}</w:p></w:hdr>",
        run_xml(&run, Some(16), Some(MUTED_CHROME))
    )
}

fn footer_xml() -> String {
    let label = Run {
        text: "Confidential — ".to_string(),
        bold: false,
        italic: false,
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:ftr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>{label}\
         <w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>\
         <w:r><w:rPr><w:sz w:val=\"16\"/><w:color w:val=\"{color}\"/></w:rPr>\
         <w:instrText xml:space=\"preserve\"> PAGE </w:instrText></w:r>\
         <w:r><w:fldChar w:fldCharType=\"end\"/></w:r>\
         </w:p></w:ftr>",
        label = run_xml(&label, Some(16), Some(MUTED_CHROME)),
        color = MUTED_CHROME,
    )
}

const CONTENT_TYPES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
<Override PartName=\"/word/header1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml\"/>\
<Override PartName=\"/word/footer1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml\"/>\
</Types>";

const ROOT_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

const DOCUMENT_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rIdStyles\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
<Relationship Id=\"rIdHeader\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/header\" Target=\"header1.xml\"/>\
<Relationship Id=\"rIdFooter\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer\" Target=\"footer1.xml\"/>\
</Relationships>";

// ── Public API ─────────────────────────────────────────────────────

static SANITIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());

/// Render a markdown proposal into a .docx file under `export_dir`.
/// Returns the path to the generated file.
pub fn export_proposal_to_docx(
    markdown_content: &str,
    client_name: &str,
    project_title: &str,
    company_name: &str,
    export_dir: &Path,
) -> Result<PathBuf, String> {
    fs::create_dir_all(export_dir)
        .map_err(|e| format!("Failed to create {}: {}", export_dir.display(), e))?;

    let safe_name = SANITIZE_RE
        .replace_all(&client_name.to_lowercase(), "_")
        .into_owned();
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let output_path = export_dir.join(format!("proposal_{safe_name}_{timestamp}.docx"));

    let file = fs::File::create(&output_path)
        .map_err(|e| format!("Failed to create {}: {}", output_path.display(), e))?;
    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default();

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        (
            "word/document.xml",
            document_xml(markdown_content, client_name, project_title, company_name),
        ),
        ("word/styles.xml", styles_xml()),
        ("word/header1.xml", header_xml(company_name, client_name)),
        ("word/footer1.xml", footer_xml()),
    ];

    for (name, content) in parts {
        archive
            .start_file(name, options)
            .map_err(|e| format!("Failed to write {}: {}", name, e))?;
        archive
            .write_all(content.as_bytes())
            .map_err(|e| format!("Failed to write {}: {}", name, e))?;
    }
    archive
        .finish()
        .map_err(|e| format!("Failed to finalize {}: {}", output_path.display(), e))?;

    log::info!("[export] Wrote {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_parse_inline_splits_bold_and_italic() {
        let runs = parse_inline("plain **bold** and *italic* end");
        assert_eq!(runs.len(), 5);
        assert_eq!(runs[1].text, "bold");
        assert!(runs[1].bold);
        assert_eq!(runs[3].text, "italic");
        assert!(runs[3].italic);
        assert_eq!(runs[4].text, " end");
    }

    #[test]
    fn test_parse_markdown_skips_rules_and_metadata() {
        let blocks = parse_markdown(
            "# 📄 Title\n\n*Generated: 2026-08-27 | Language: English | v1.0*\n\n---\n\nBody text.",
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
        matches!(&blocks[1], Block::Paragraph(_));
    }

    #[test]
    fn test_parse_markdown_collects_tables() {
        let md = "| Role | Hours |\n|------|-------|\n| PM | 60h |\n| QA | 100h |\n\nAfter.";
        let blocks = parse_markdown(md);
        let Block::Table(rows) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0][0].text, "Role");
        assert_eq!(rows[2][1][0].text, "100h");
    }

    #[test]
    fn test_table_at_end_of_input_is_flushed() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |";
        let blocks = parse_markdown(md);
        assert_eq!(blocks.len(), 1);
        matches!(&blocks[0], Block::Table(_));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_export_creates_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_proposal_to_docx(
            "# Proposal\n\nSome body with **bold** text.\n\n- item one\n- item two",
            "Acme Corp!",
            "Technical Proposal",
            "AZA FUTURE",
            dir.path(),
        )
        .unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let pattern = Regex::new(r"^proposal_acme_corp__\d{8}_\d{6}\.docx$").unwrap();
        assert!(pattern.is_match(&name), "{}", name);
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
