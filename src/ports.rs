//! Presentation ports. The wizard owns these as optional trait objects; a
//! missing port makes its step log a [`RenderError`] and skip.

use crate::error::RenderError;
use crate::export::ReportDocument;
use crate::render::chart::LineChartConfig;
use crate::render::Canvas;

/// Draws a line chart into a canvas.
pub trait ChartRenderer: Send {
    fn draw(&self, canvas: &mut Canvas, config: LineChartConfig) -> Result<(), RenderError>;
}

/// Serializes a report into a downloadable document.
pub trait DocumentBuilder: Send {
    fn build(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError>;
}

#[derive(Default)]
pub struct Renderers {
    pub chart: Option<Box<dyn ChartRenderer>>,
    pub document: Option<Box<dyn DocumentBuilder>>,
}

impl Renderers {
    /// PNG raster charts and DOCX documents.
    pub fn standard() -> Self {
        Self {
            chart: Some(Box::new(crate::render::raster::RasterChartRenderer::default())),
            document: Some(Box::new(crate::export::docx::DocxBuilder::default())),
        }
    }
}

/// In-memory adapters for tests and environments without raster output.
pub mod stub {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records the chart configuration without producing a snapshot.
    #[derive(Debug, Clone, Default)]
    pub struct StubChartRenderer {
        draws: Arc<AtomicUsize>,
    }

    impl StubChartRenderer {
        pub fn draws(&self) -> usize {
            self.draws.load(Ordering::SeqCst)
        }
    }

    impl ChartRenderer for StubChartRenderer {
        fn draw(&self, canvas: &mut Canvas, config: LineChartConfig) -> Result<(), RenderError> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            canvas.chart = Some(config);
            Ok(())
        }
    }

    /// Writes the document outline as plain text.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct OutlineDocumentBuilder;

    impl DocumentBuilder for OutlineDocumentBuilder {
        fn build(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
            let mut out = format!("# {}\n", document.heading);
            for line in &document.metadata {
                out.push_str(line);
                out.push('\n');
            }
            for section in &document.sections {
                out.push_str(&format!("\n## {}\n", section.title));
                for paragraph in &section.paragraphs {
                    out.push_str(paragraph);
                    out.push('\n');
                }
            }
            if let Some(png) = &document.chart_png {
                out.push_str(&format!("\n[chart: {} bytes]\n", png.len()));
            }
            Ok(out.into_bytes())
        }
    }
}
