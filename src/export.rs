use anyhow::Context;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::StudentRecord;

pub const DATA_FILE: &str = "data.json";
pub const SPREADSHEET_FILE: &str = "students.xlsx";
pub const SHEET_NAME: &str = "Students";
pub const SPREADSHEET_HEADERS: [&str; 4] = ["Name", "Career", "Origin", "Phone"];

const SHEET_ENTRY: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub row_count: usize,
}

/// Write the set as pretty JSON through a temp file and rename, so readers
/// never observe a half-written file.
pub fn write_json_atomic(path: &Path, records: &[StudentRecord]) -> anyhow::Result<()> {
    let body = serde_json::to_vec_pretty(records).context("failed to serialize students")?;
    let tmp = path.with_extension("json.writing");
    std::fs::write(&tmp, body)
        .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
    std::fs::rename(&tmp, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            tmp.to_string_lossy(),
            path.to_string_lossy()
        )
    })?;
    Ok(())
}

/// Single-sheet workbook with the fixed header row.
pub fn export_spreadsheet(records: &[StudentRecord], out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let tmp = out_path.with_extension("xlsx.writing");
    let out_file = File::create(&tmp)
        .with_context(|| format!("failed to create output file {}", tmp.to_string_lossy()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>{}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified></cp:coreProperties>"#,
        env!("CARGO_PKG_NAME"),
    );
    let workbook_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    );

    let entries: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("docProps/core.xml", core_xml),
        ("xl/workbook.xml", workbook_xml),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        (SHEET_ENTRY, sheet_xml(records)),
    ];
    for (name, body) in entries.iter() {
        zip.start_file(*name, opts)
            .with_context(|| format!("failed to start {name} entry"))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write {name} entry"))?;
    }
    zip.finish().context("failed to finalize workbook")?;

    std::fs::rename(&tmp, out_path).with_context(|| {
        format!(
            "failed to move workbook into place at {}",
            out_path.to_string_lossy()
        )
    })?;

    Ok(ExportSummary {
        path: out_path.to_path_buf(),
        row_count: records.len(),
    })
}

fn sheet_xml(records: &[StudentRecord]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    push_row(&mut xml, 1, &SPREADSHEET_HEADERS);
    for (i, r) in records.iter().enumerate() {
        let cells = [
            r.name.as_str(),
            r.career.as_str(),
            r.origin_city.as_str(),
            r.phone.as_str(),
        ];
        push_row(&mut xml, i + 2, &cells);
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, row: usize, cells: &[&str]) {
    xml.push_str(&format!(r#"<row r="{row}">"#));
    for (col, value) in ["A", "B", "C", "D"].iter().zip(cells) {
        xml.push_str(&format!(
            r#"<c r="{col}{row}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            xml_escape(value)
        ));
    }
    xml.push_str("</row>");
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not representable in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

/// Best-effort file copies of the canonical set, refreshed after writes.
pub struct FileMirror {
    data_dir: PathBuf,
    write_json: bool,
    lock: Mutex<()>,
}

impl FileMirror {
    /// Spreadsheet only; the JSON file is already the primary store.
    pub fn spreadsheet(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_json: false,
            lock: Mutex::new(()),
        }
    }

    /// Spreadsheet plus `data.json` as a secondary file store.
    pub fn secondary_store(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_json: true,
            lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Rewrite the mirror files from `load`, which runs under the mirror lock
    /// so concurrent refreshes cannot publish an older snapshot last.
    pub fn refresh<F>(&self, load: F) -> anyhow::Result<ExportSummary>
    where
        F: FnOnce() -> anyhow::Result<Vec<StudentRecord>>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("mirror lock poisoned"))?;
        let records = load()?;
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "failed to create directory {}",
                self.data_dir.to_string_lossy()
            )
        })?;
        if self.write_json {
            write_json_atomic(&self.data_dir.join(DATA_FILE), &records)?;
        }
        let summary = export_spreadsheet(&records, &self.data_dir.join(SPREADSHEET_FILE))?;
        debug!(
            path = %summary.path.to_string_lossy(),
            rows = summary.row_count,
            "mirror refreshed"
        );
        Ok(summary)
    }
}
