//! Minimal WordprocessingML writer.
//!
//! Produces a package with a single document part, direct run formatting
//! instead of a styles part, and at most one inline PNG.

use super::ReportDocument;
use crate::error::RenderError;
use crate::ports::DocumentBuilder;
use image::ImageFormat;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CHART_REL_ID: &str = "rIdChart";
const CHART_PART: &str = "word/media/chart.png";
// 6.5 inches of text width in EMU.
const IMAGE_WIDTH_EMU: u64 = 5_943_600;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

const SECTION_PROPERTIES: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxBuilder;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// One paragraph with a single run. `size` is in half-points.
fn paragraph(text: &str, bold: bool, size: Option<u32>) -> String {
    let mut props = String::new();
    if bold {
        props.push_str("<w:b/>");
    }
    if let Some(sz) = size {
        props.push_str(&format!(r#"<w:sz w:val="{sz}"/>"#));
    }
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{props}</w:rPr>")
    };
    format!(
        r#"<w:p><w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

fn inline_image(width_px: u32, height_px: u32) -> String {
    let cx = IMAGE_WIDTH_EMU;
    let cy = if width_px == 0 {
        cx / 2
    } else {
        cx * u64::from(height_px) / u64::from(width_px)
    };
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="Trend chart"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="chart.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        cx = cx,
        cy = cy,
        rel = CHART_REL_ID,
    )
}

impl DocxBuilder {
    pub fn document_xml(&self, doc: &ReportDocument, image_size: Option<(u32, u32)>) -> String {
        let mut body = String::new();
        body.push_str(&paragraph(&doc.heading, true, Some(32)));
        for line in &doc.metadata {
            body.push_str(&paragraph(line, false, None));
        }
        for section in &doc.sections {
            body.push_str(&paragraph(&section.title, true, Some(26)));
            for p in &section.paragraphs {
                body.push_str(&paragraph(p, false, None));
            }
        }
        if let Some((w, h)) = image_size {
            body.push_str(&inline_image(w, h));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {DOCUMENT_NAMESPACES}><w:body>{body}{SECTION_PROPERTIES}</w:body></w:document>"#
        )
    }

    fn document_rels(with_image: bool) -> String {
        let image = if with_image {
            format!(
                r#"<Relationship Id="{CHART_REL_ID}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/chart.png"/>"#
            )
        } else {
            String::new()
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{image}</Relationships>"#
        )
    }
}

impl DocumentBuilder for DocxBuilder {
    fn build(&self, doc: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let image_size = match &doc.chart_png {
            Some(png) => {
                let img = image::load_from_memory_with_format(png, ImageFormat::Png)?;
                Some((img.width(), img.height()))
            }
            None => None,
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;
        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml(doc, image_size).as_bytes())?;
        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(Self::document_rels(image_size.is_some()).as_bytes())?;
        if let Some(png) = &doc.chart_png {
            zip.start_file(CHART_PART, FileOptions::default().compression_method(CompressionMethod::Stored))?;
            zip.write_all(png)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}
