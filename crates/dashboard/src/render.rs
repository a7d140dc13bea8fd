use std::fmt::Write as _;

use crate::views::{DashboardView, LoadState, UploadView};

pub const DASHBOARD_PATH: &str = "/";
pub const UPLOAD_PATH: &str = "/upload";
pub const EXPORT_PATH: &str = "/export";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n\
         <nav><a href=\"{DASHBOARD_PATH}\">Dashboard</a> | <a href=\"{UPLOAD_PATH}\">Upload CSV</a></nav>\n\
         <main>\n{body}</main>\n\
         </body>\n\
         </html>\n",
        title = escape_html(title),
    )
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut body = String::new();
    body.push_str("<h2>Engagement Summary</h2>\n");
    match &view.load {
        LoadState::Loading => {
            body.push_str("<p class=\"status\">Loading engagement data...</p>\n");
        }
        LoadState::Error(reason) => {
            let _ = writeln!(
                body,
                "<p class=\"error\" role=\"alert\">Could not load engagement data. {}</p>",
                escape_html(reason)
            );
        }
        LoadState::Idle | LoadState::Loaded => {}
    }

    body.push_str("<pre class=\"summary\">");
    for (key, value) in view.summary.display_entries() {
        let _ = writeln!(body, "{}: {}", escape_html(&key), escape_html(&value));
    }
    body.push_str("</pre>\n");

    body.push_str("<h3>Engagement Logs</h3>\n<table border=\"1\">\n<thead>\n");
    body.push_str("<tr><th>User</th><th>User Type</th><th>Actions</th><th>Date</th></tr>\n");
    body.push_str("</thead>\n<tbody>\n");
    for record in &view.records {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&record.user),
            escape_html(&record.user_type),
            record.actions,
            escape_html(&record.date),
        );
    }
    body.push_str("</tbody>\n</table>\n");

    if let Some(reason) = view.export.error() {
        let _ = writeln!(
            body,
            "<p class=\"error\" role=\"alert\">Export failed. {}</p>",
            escape_html(reason)
        );
    }
    let _ = writeln!(
        body,
        "<form method=\"get\" action=\"{EXPORT_PATH}\"><button type=\"submit\">Export CSV</button></form>"
    );

    layout("Engagement Dashboard", &body)
}

pub fn render_upload(view: &UploadView) -> String {
    let mut body = String::new();
    body.push_str("<h2>Upload Engagement CSV</h2>\n");
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"{UPLOAD_PATH}\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\".csv\"> \
         <button type=\"submit\">Upload</button></form>"
    );
    if let Some(file) = &view.selected_file {
        let _ = writeln!(
            body,
            "<p class=\"selected-file\">Selected file: {}</p>",
            escape_html(&file.file_name)
        );
    }
    let _ = writeln!(
        body,
        "<p class=\"status\">{}</p>",
        escape_html(&view.status_message)
    );
    if let Some(detail) = &view.last_error {
        let _ = writeln!(
            body,
            "<p class=\"error-detail\">{}</p>",
            escape_html(detail)
        );
    }

    layout("Upload Engagement CSV", &body)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
