//! HTML pages served by the portal.
//!
//! Pages are small and self-contained (inline CSS, no scripts), built as
//! strings with every dynamic value escaped.

use portal_core::{Config, RawSubmissionForm, ReportFormat};
use portal_services::{escape_html, BatchOutcome};

const STYLE: &str = "body{font-family:sans-serif;max-width:48em;margin:2em auto;padding:0 1em}\
label{display:block;margin-top:1em}ul.errors{color:#a00}table{border-collapse:collapse}\
td{padding:.2em 1em .2em 0}";

/// Seconds before a pending report page reloads itself.
pub const PENDING_REFRESH_SECS: u32 = 30;

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">{}<title>{}</title>\
         <style>{}</style></head><body>\n<h1>{}</h1>\n{}\n</body></html>\n",
        head_extra,
        escape_html(title),
        STYLE,
        escape_html(title),
        body
    )
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape_html(e)))
        .collect();
    format!("<ul class=\"errors\">{}</ul>\n", items)
}

fn options(choices: &[String], selected: &str, with_default: bool) -> String {
    let mut html = String::new();
    if with_default {
        html.push_str("<option value=\"\">Any</option>");
    }
    for choice in choices {
        let escaped = escape_html(choice);
        let mark = if choice == selected { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            escaped, mark, escaped
        ));
    }
    html
}

/// Values the form starts with on first display.
pub fn blank_form() -> RawSubmissionForm {
    RawSubmissionForm {
        timeout: "2".to_string(),
        priority: "1".to_string(),
        reports: vec![ReportFormat::Html.extension().to_string()],
        ..RawSubmissionForm::default()
    }
}

/// The submission form filled with `values`, preceded by any errors from the
/// previous attempt. Uploaded files are never echoed back.
pub fn form_page(config: &Config, values: &RawSubmissionForm, errors: &[String]) -> String {
    let selected: Vec<ReportFormat> = values
        .reports
        .iter()
        .filter_map(|r| ReportFormat::from_form_value(r.trim()))
        .collect();
    let formats: String = ReportFormat::ALL
        .iter()
        .map(|format| {
            format!(
                "<label><input type=\"checkbox\" name=\"report\" value=\"{ext}\"{checked}> {ext}</label>",
                ext = format.extension(),
                checked = if selected.contains(format) { " checked" } else { "" },
            )
        })
        .collect();

    let body = format!(
        "{errors}<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <label>Files <input type=\"file\" name=\"file\" multiple></label>\n\
         <label>URLs (one per line)<br><textarea name=\"url\" rows=\"4\" cols=\"60\">{urls}</textarea></label>\n\
         <label>Timeout (minutes) <input type=\"text\" name=\"timeout\" value=\"{timeout}\" size=\"3\"></label>\n\
         <label>Priority <input type=\"text\" name=\"priority\" value=\"{priority}\" size=\"3\"></label>\n\
         <label>Machine <select name=\"machine\">{machines}</select></label>\n\
         <label>Route <select name=\"route\">{routes}</select></label>\n\
         <label>Email <input type=\"email\" name=\"email\" value=\"{email}\" size=\"40\"></label>\n\
         <fieldset><legend>Report formats</legend>{formats}</fieldset>\n\
         <p><button type=\"submit\">Submit</button></p>\n</form>",
        errors = error_list(errors),
        urls = escape_html(&values.urls),
        timeout = escape_html(&values.timeout),
        priority = escape_html(&values.priority),
        machines = options(&config.machines, values.machine.trim(), true),
        routes = options(&config.routes, values.route.trim(), false),
        email = escape_html(&values.email),
        formats = formats,
    );
    layout("Submit a sample", "", &body)
}

/// Links to every requested report of every accepted target.
pub fn submitted_page(outcome: &BatchOutcome, formats: &[ReportFormat]) -> String {
    let mut rows = String::new();
    for accepted in &outcome.accepted {
        let id = accepted.correlation_id.to_string();
        let links: Vec<String> = formats
            .iter()
            .map(|format| {
                format!(
                    "<a href=\"/report/{id}.{ext}\">{ext}</a>",
                    id = id,
                    ext = format.extension()
                )
            })
            .collect();
        rows.push_str(&format!(
            "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
            escape_html(&accepted.name),
            id,
            links.join(" ")
        ));
    }

    let failures: Vec<String> = outcome.failures.iter().map(|f| f.message()).collect();
    let body = format!(
        "<p>Your samples were submitted. Keep these links: they are the only way to \
         retrieve the reports.</p>\n{}<table>\n{}</table>\n<p><a href=\"/\">Submit more</a></p>",
        error_list(&failures),
        rows
    );
    layout("Submission accepted", "", &body)
}

/// Shown while the sandbox is still analysing the sample.
pub fn pending_page() -> String {
    layout(
        "Analysis in progress",
        &format!(
            "<meta http-equiv=\"refresh\" content=\"{}\">",
            PENDING_REFRESH_SECS
        ),
        &format!(
            "<p>The analysis has not finished yet. This page refreshes every {} seconds.</p>",
            PENDING_REFRESH_SECS
        ),
    )
}

pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        "",
        &format!(
            "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
            escape_html(message)
        ),
    )
}
