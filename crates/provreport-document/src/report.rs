//! Report formats, content negotiation and the serialization entry point.

use crate::{dot, prov_json, prov_xml, provn, ProvDocument};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to encode prov-json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write prov-xml: {0}")]
    Xml(String),

    #[error("failed to run graphviz `{program}`: {source}")]
    GraphvizSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("graphviz `{program}` exited with {status}:\n{stderr}")]
    GraphvizFailed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Xml,
    Provn,
    Jpg,
    Svg,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 5] = [
        ReportFormat::Json,
        ReportFormat::Xml,
        ReportFormat::Provn,
        ReportFormat::Jpg,
        ReportFormat::Svg,
    ];

    /// Parse a `format` selector. Unknown selectors fall back to JSON so
    /// the report stays machine-readable.
    pub fn parse(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    /// Strict variant of [`ReportFormat::parse`].
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "provn" | "prov-n" => Some(Self::Provn),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    fn from_media_type(media: &str) -> Option<Self> {
        let essence = media.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "text/xml" | "application/xml" => Some(Self::Xml),
            "text/provenance-notation" => Some(Self::Provn),
            "image/jpeg" => Some(Self::Jpg),
            "image/svg+xml" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Pick a format from an explicit `format` parameter, else from the
    /// first recognised media type of an `Accept` header, else JSON. A
    /// present but unknown parameter selects JSON and ignores `Accept`.
    pub fn negotiate(format_param: Option<&str>, accept: Option<&str>) -> Self {
        if let Some(f) = format_param {
            return Self::parse(f);
        }
        accept
            .into_iter()
            .flat_map(|h| h.split(','))
            .find_map(Self::from_media_type)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Provn => "provn",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "text/xml; charset=utf8",
            Self::Provn => "text/provenance-notation; charset=utf8",
            Self::Jpg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Jpg | Self::Svg)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Draw element attribute tables in rendered images.
    pub show_attributes: bool,
    /// Graphviz executable used for image formats.
    pub dot_program: PathBuf,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_attributes: true,
            dot_program: PathBuf::from("dot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub format: ReportFormat,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Serialize `doc` in `format`. The document is only borrowed.
pub fn serialize_prov_document(
    doc: &ProvDocument,
    format: ReportFormat,
    options: &RenderOptions,
) -> Result<RenderedReport, RenderError> {
    let body = match format {
        ReportFormat::Json => prov_json::to_prov_json_string(doc)?.into_bytes(),
        ReportFormat::Xml => prov_xml::to_prov_xml(doc)?.into_bytes(),
        ReportFormat::Provn => provn::to_provn(doc).into_bytes(),
        ReportFormat::Jpg | ReportFormat::Svg => {
            let text = dot::to_dot(doc, options.show_attributes);
            run_graphviz(&options.dot_program, format, &text)?
        }
    };
    Ok(RenderedReport {
        format,
        content_type: format.content_type(),
        body,
    })
}

/// Lay out and rasterize DOT text with the Graphviz `dot` executable.
pub fn run_graphviz(
    program: &Path,
    format: ReportFormat,
    dot_text: &str,
) -> Result<Vec<u8>, RenderError> {
    let spawn_err = |source| RenderError::GraphvizSpawn {
        program: program.to_path_buf(),
        source,
    };

    let mut child = Command::new(program)
        .arg(format!("-T{}", format.as_str()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    // Feed stdin from another thread so a large image on stdout cannot
    // block the write.
    let mut stdin = child.stdin.take();
    let input = dot_text.to_owned();
    let writer = std::thread::spawn(move || match stdin.as_mut() {
        Some(s) => s.write_all(input.as_bytes()),
        None => Ok(()),
    });

    let output = child.wait_with_output().map_err(spawn_err)?;
    if let Ok(Err(e)) = writer.join() {
        tracing::debug!(error = %e, "graphviz closed stdin early");
    }

    if !output.status.success() {
        return Err(RenderError::GraphvizFailed {
            program: program.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}
