//! HTML review pages

use super::stats_embed::embed_stats;
use crate::render::escape_markup;
use crate::types::{ArtifactKind, ArtifactSet, Phase, QcStatus, ScanKey, ARTIFACT_KINDS};
use std::fmt;
use std::path::Path;

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 20px; }
    .nav { margin-bottom: 20px; }
    .nav span, .nav a { margin-right: 20px; font-weight: bold; }
    .section { margin-bottom: 30px; }
    .png-image, .svg-image { max-width: 90%; border: 1px solid #ccc; margin-bottom: 10px; display: block; }
    .stats-table { border-collapse: collapse; margin-top: 10px; }
    .stats-table td, .stats-table th { border: 1px solid #999; padding: 6px 10px; }
    .annotation-container { position: relative; display: inline-block; }
    .annot-canvas { position: absolute; top: 0; left: 0; opacity: 0.6; }
    .qc-buttons { margin: 20px 0; }
    .qc-buttons button { margin-right: 10px; padding: 8px 12px; font-size: 14px; cursor: pointer; }
    .qc-status { font-weight: bold; margin-left: 20px; }
"#;

// Freehand drawing on the canvas laid over each image
const ANNOTATION_SCRIPT: &str = r#"
function resizeCanvas(elem) {
    const canvas = elem.parentNode.querySelector('.annot-canvas');
    if (canvas) {
        canvas.width = elem.offsetWidth;
        canvas.height = elem.offsetHeight;
    }
}
document.addEventListener('DOMContentLoaded', function() {
    document.querySelectorAll('.annotation-container').forEach(container => {
        const canvas = container.querySelector('.annot-canvas');
        if (!canvas) return;
        const ctx = canvas.getContext('2d');
        let drawing = false;
        canvas.addEventListener('mousedown', e => { drawing = true; ctx.beginPath(); ctx.moveTo(e.offsetX, e.offsetY); });
        canvas.addEventListener('mousemove', e => {
            if (!drawing) return;
            ctx.lineWidth = 2;
            ctx.lineCap = 'round';
            ctx.strokeStyle = 'red';
            ctx.lineTo(e.offsetX, e.offsetY);
            ctx.stroke();
        });
        canvas.addEventListener('mouseup', () => { drawing = false; });
        canvas.addEventListener('mouseleave', () => { drawing = false; });
    });
});
"#;

/// Placeholder for an artifact that was not found
pub fn not_found(title: &str) -> String {
    format!(
        "<h3>{}</h3><p style='color:red;'>No file found.</p>",
        escape_markup(title)
    )
}

/// Previous/next links; an end of the sequence shows a gray label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nav {
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl fmt::Display for Nav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<div class=\"nav\">")?;
        for (href, label) in [(&self.prev, "Previous"), (&self.next, "Next")] {
            match href {
                Some(href) => write!(f, "<a href=\"{}\">{}</a>", escape_markup(href), label)?,
                None => write!(f, "<span style=\"color:gray;\">{}</span>", label)?,
            }
        }
        write!(f, "</div>")
    }
}

/// One artifact block of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Png { title: String, src: String },
    Svg { title: String, src: String },
    Html(String),
    Missing(String),
}

impl Section {
    /// Builds the blocks of an artifact set in slot order
    ///
    /// `src_for` maps an artifact to the URL the page loads it from.
    /// Statistics are read and embedded inline.
    pub fn for_artifacts<F>(artifacts: &ArtifactSet, mut src_for: F) -> Vec<Section>
    where
        F: FnMut(ArtifactKind, &Path) -> String,
    {
        ARTIFACT_KINDS
            .iter()
            .map(|&kind| match artifacts.get(kind) {
                None => Section::Missing(kind.title().to_string()),
                Some(path) => match kind {
                    ArtifactKind::Stats => Section::Html(embed_stats(path)),
                    ArtifactKind::Density => Section::Svg {
                        title: kind.title().to_string(),
                        src: src_for(kind, path),
                    },
                    ArtifactKind::OriginalSlices | ArtifactKind::StrippedSlices => Section::Png {
                        title: kind.title().to_string(),
                        src: src_for(kind, path),
                    },
                },
            })
            .collect()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Png { title, src } => write!(
                f,
                "<h3>{}</h3>\n<div class=\"annotation-container\">\
                 <img class=\"png-image\" src=\"{}\" onload=\"resizeCanvas(this)\"/>\
                 <canvas class=\"annot-canvas\"></canvas></div>",
                escape_markup(title),
                escape_markup(src)
            ),
            Section::Svg { title, src } => write!(
                f,
                "<h3>{}</h3>\n<div class=\"annotation-container\">\
                 <object class=\"svg-image\" type=\"image/svg+xml\" data=\"{}\" onload=\"resizeCanvas(this)\"></object>\
                 <canvas class=\"annot-canvas\"></canvas></div>",
                escape_markup(title),
                escape_markup(src)
            ),
            Section::Html(html) => f.write_str(html),
            Section::Missing(title) => f.write_str(&not_found(title)),
        }
    }
}

/// How the Good/Bad/Unclear buttons record a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewWidget {
    /// Decisions stay in the browser under keys derived from `storage_key`
    LocalStorage { storage_key: String },
    /// Decisions are posted to `/qc_update` under the ledger key `filename`
    Server {
        filename: String,
        status: QcStatus,
        notes: String,
    },
}

impl ReviewWidget {
    fn initial_status(&self) -> QcStatus {
        match self {
            ReviewWidget::LocalStorage { .. } => QcStatus::Unknown,
            ReviewWidget::Server { status, .. } => *status,
        }
    }

    fn initial_notes(&self) -> &str {
        match self {
            ReviewWidget::LocalStorage { .. } => "",
            ReviewWidget::Server { notes, .. } => notes,
        }
    }

    fn script(&self) -> String {
        match self {
            ReviewWidget::LocalStorage { storage_key } => {
                let key = js_string(storage_key);
                format!(
                    r#"
const STATUS_KEY = "QC_" + {key};
const NOTES_KEY = "QC_NOTES_" + {key};
function showStatus(status) {{
    document.getElementById('qcStatusDisplay').innerText = "Status: " + status;
}}
function saveNotes() {{
    localStorage.setItem(NOTES_KEY, document.getElementById('qcNotes').value);
}}
function markQC(status) {{
    localStorage.setItem(STATUS_KEY, status);
    showStatus(status);
    saveNotes();
}}
document.addEventListener('DOMContentLoaded', function() {{
    const status = localStorage.getItem(STATUS_KEY);
    if (status) showStatus(status);
    const notes = localStorage.getItem(NOTES_KEY);
    if (notes) document.getElementById('qcNotes').value = notes;
}});
"#
                )
            }
            ReviewWidget::Server { filename, .. } => {
                let filename = js_string(filename);
                format!(
                    r#"
function postUpdate(status) {{
    const notes = document.getElementById('qcNotes').value;
    fetch("/qc_update", {{
        method: "POST",
        headers: {{ "Content-Type": "application/json" }},
        body: JSON.stringify({{ filename: {filename}, status: status, notes: notes }})
    }})
    .then(r => r.json())
    .then(d => console.log(d))
    .catch(err => console.error("Error:", err));
}}
function markQC(status) {{
    document.getElementById('qcStatusDisplay').innerText = "Status: " + status;
    postUpdate(status);
}}
function saveNotes() {{
    const text = document.getElementById('qcStatusDisplay').innerText;
    const status = text.replace("Status: ", "");
    if (status !== "UNKNOWN") postUpdate(status);
}}
"#
                )
            }
        }
    }
}

impl fmt::Display for ReviewWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<div class=\"qc-buttons\">")?;
        for (status, label) in [
            (QcStatus::Good, "Good"),
            (QcStatus::Bad, "Bad"),
            (QcStatus::Unclear, "Unclear"),
        ] {
            writeln!(
                f,
                "<button onclick=\"markQC('{}')\">{}</button>",
                status, label
            )?;
        }
        writeln!(
            f,
            "<span class=\"qc-status\" id=\"qcStatusDisplay\">Status: {}</span>",
            self.initial_status()
        )?;
        writeln!(
            f,
            "<label for=\"qcNotes\" style=\"margin-left: 20px;\">Notes:</label>\
             <input type=\"text\" id=\"qcNotes\" value=\"{}\" onchange=\"saveNotes()\" placeholder=\"Add notes here...\"/>",
            escape_markup(self.initial_notes())
        )?;
        write!(f, "</div>")
    }
}

/// Review page of one scan key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub key: ScanKey,
    pub phase: Phase,
    pub nav: Nav,
    pub sections: Vec<Section>,
    pub review: ReviewWidget,
}

impl fmt::Display for ReportPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = &self.key;
        let subject = escape_markup(&key.subject);
        let session = escape_markup(&key.session);
        let run = escape_markup(&key.run);

        writeln!(f, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />")?;
        if run.is_empty() {
            writeln!(f, "<title>{} {} Report ({})</title>", subject, session, self.phase)?;
        } else {
            writeln!(
                f,
                "<title>{} {} {} Report ({})</title>",
                subject, session, run, self.phase
            )?;
        }
        writeln!(f, "<style>{}</style>\n</head>\n<body>", STYLE)?;

        writeln!(f, "{}", self.nav)?;
        if run.is_empty() {
            writeln!(
                f,
                "<h2>Subject: {} | Session: {} | Phase: {}</h2>",
                subject, session, self.phase
            )?;
        } else {
            writeln!(
                f,
                "<h2>Subject: {} | Session: {} | Run: {} | Phase: {}</h2>",
                subject, session, run, self.phase
            )?;
        }
        writeln!(f, "{}", self.review)?;

        for section in &self.sections {
            writeln!(f, "<div class=\"section\">\n{}\n</div>", section)?;
        }

        writeln!(
            f,
            "<script>{}{}</script>",
            ANNOTATION_SCRIPT,
            self.review.script()
        )?;
        writeln!(f, "</body>\n</html>")
    }
}

/// Quotes a value as a JavaScript string literal safe inside `<script>`
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}
