//! HTML report with an embedded JSON model

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cfgcache_config::constants::REPORT_FILE_NAME;
use cfgcache_errors::{Error, ReportError};
use cfgcache_types::PropertyProblem;
use serde::Serialize;

use crate::ReportWriter;

/// JSON model embedded in the report page
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub cache_action: String,
    pub requested_tasks: String,
    pub total_problem_count: usize,
    pub documentation_link: String,
    pub diagnostics: Vec<ReportDiagnostic>,
}

/// One forwarded problem as it appears in the report
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDiagnostic {
    pub location: String,
    pub trace: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_link: Option<String>,
}

/// Report writer producing `configuration-cache-report.html`
#[derive(Debug)]
pub struct HtmlReport {
    documentation_url: String,
    diagnostics: Mutex<Vec<ReportDiagnostic>>,
}

impl HtmlReport {
    #[must_use]
    pub fn new(documentation_url: impl Into<String>) -> Self {
        Self {
            documentation_url: documentation_url.into(),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Number of problems collected so far
    #[must_use]
    pub fn collected(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportDiagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn document(
        &self,
        cache_action: &str,
        requested_tasks: &str,
        problem_count: usize,
    ) -> ReportDocument {
        ReportDocument {
            cache_action: cache_action.to_string(),
            requested_tasks: requested_tasks.to_string(),
            total_problem_count: problem_count,
            documentation_link: self.documentation_url.clone(),
            diagnostics: self.lock().clone(),
        }
    }
}

impl ReportWriter for HtmlReport {
    fn on_problem(&self, problem: &PropertyProblem) {
        let diagnostic = ReportDiagnostic {
            location: problem.trace.user_code_location().to_string(),
            trace: problem.trace.to_string(),
            message: problem.message.clone(),
            error: problem.cause.as_ref().map(ToString::to_string),
            documentation_link: problem
                .documentation
                .map(|section| section.link(&self.documentation_url)),
        };
        self.lock().push(diagnostic);
    }

    fn write_report_file_to(
        &self,
        output_dir: &Path,
        cache_action: &str,
        requested_tasks: &str,
        problem_count: usize,
    ) -> Result<Option<PathBuf>, Error> {
        let document = self.document(cache_action, requested_tasks, problem_count);
        if document.diagnostics.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(output_dir)
            .map_err(|e| ReportError::output_directory(&e, output_dir))?;

        let html = render_html(&document)?;
        let report_file = output_dir.join(REPORT_FILE_NAME);
        let temp_file = output_dir.join(format!("{REPORT_FILE_NAME}.tmp"));

        fs::write(&temp_file, html).map_err(|e| ReportError::write_failed(&e, &temp_file))?;
        if let Err(e) = fs::rename(&temp_file, &report_file) {
            let _ = fs::remove_file(&temp_file);
            return Err(ReportError::write_failed(&e, &report_file).into());
        }

        tracing::debug!(
            path = %report_file.display(),
            diagnostics = document.diagnostics.len(),
            problem_count,
            "wrote configuration cache report"
        );
        Ok(Some(report_file))
    }
}

fn render_html(document: &ReportDocument) -> Result<String, Error> {
    let json = serde_json::to_string(document)?;
    let problems = if document.total_problem_count == 1 {
        "1 problem was found"
    } else {
        "problems were found"
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Configuration cache report</title>\n</head>\n<body>\n");
    if document.total_problem_count == 1 {
        let _ = writeln!(
            html,
            "<h1>{problems} {} the configuration cache</h1>",
            escape_html(&document.cache_action)
        );
    } else {
        let _ = writeln!(
            html,
            "<h1>{} {problems} {} the configuration cache</h1>",
            document.total_problem_count,
            escape_html(&document.cache_action)
        );
    }
    let _ = writeln!(
        html,
        "<p>Requested tasks: <code>{}</code></p>",
        escape_html(&document.requested_tasks)
    );
    html.push_str("<ul>\n");
    for diagnostic in &document.diagnostics {
        let _ = write!(
            html,
            "<li><code>{}</code>: {}",
            escape_html(&diagnostic.location),
            escape_html(&diagnostic.message)
        );
        if let Some(link) = &diagnostic.documentation_link {
            let _ = write!(html, " (<a href=\"{0}\">{0}</a>)", escape_html(link));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
    // `</` would close the script element early
    let _ = writeln!(
        html,
        "<script type=\"application/json\" id=\"configuration-cache-report\">{}</script>",
        json.replace("</", "<\\/")
    );
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
