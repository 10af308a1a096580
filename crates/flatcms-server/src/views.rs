//! HTML views.
//!
//! Every page is the shared layout with a body fragment substituted in.
//! User-controlled text (file names, document content, usernames) is always
//! escaped; only rendered markdown is embedded raw.
//!
//! Rendering a page through [`page`] consumes the session's flash message.

use std::fmt::Write as _;

use axum::http::StatusCode;
use axum::response::Html;

use flatcms_core::session::Session;

/// Render a full page, consuming any pending flash message.
pub fn page(session: &mut Session, title: &str, body: &str) -> Html<String> {
    let flash = session
        .take_flash()
        .map(|msg| format!("<p class=\"flash\">{}</p>", escape_html(&msg)))
        .unwrap_or_default();

    Html(
        LAYOUT
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{FLASH}}", &flash)
            .replace("{{BODY}}", body),
    )
}

/// Standalone error page; no session involved.
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to documents</a></p>",
        escape_html(title),
        escape_html(message)
    );
    Html(
        LAYOUT
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{FLASH}}", "")
            .replace("{{BODY}}", &body),
    )
}

/// Listing of every document, with edit/delete controls when signed in.
pub fn index(names: &[String], username: Option<&str>) -> String {
    let mut items = String::new();
    for name in names {
        let href = document_href(name);
        let label = escape_html(name);
        let _ = write!(items, "  <li><a href=\"{href}\">{label}</a>");
        if username.is_some() {
            let _ = write!(
                items,
                " <a href=\"{href}/edit\">edit</a>\
                 <form class=\"inline\" method=\"post\" action=\"{href}/delete\">\
                 <button type=\"submit\">delete</button></form>"
            );
        }
        items.push_str("</li>\n");
    }

    let account = match username {
        Some(user) => format!(
            "<form class=\"inline\" method=\"post\" action=\"/users/signout\">\
             <p class=\"user-status\">Signed in as {}. <button type=\"submit\">Sign Out</button></p></form>",
            escape_html(user)
        ),
        None => "<p class=\"user-status\"><a href=\"/users/signin\">Sign In</a></p>".to_owned(),
    };

    INDEX
        .replace("{{ITEMS}}", &items)
        .replace("{{ACCOUNT}}", &account)
}

/// Sign-in form, prefilled with the last submitted username.
pub fn signin(username: &str) -> String {
    SIGNIN.replace("{{USERNAME}}", &escape_html(username))
}

/// New-document form, prefilled with the last submitted name.
pub fn new_document(filename: &str) -> String {
    NEW_DOCUMENT.replace("{{FILENAME}}", &escape_html(filename))
}

/// Edit form for an existing document.
pub fn edit_document(name: &str, content: &str) -> String {
    EDIT_DOCUMENT
        .replace("{{ACTION}}", &document_href(name))
        .replace("{{NAME}}", &escape_html(name))
        .replace("{{CONTENT}}", &escape_html(content))
}

/// Rendered markdown document. `html` is trusted output of the renderer.
pub fn markdown_document(html: &str) -> String {
    format!("<article class=\"document\">\n{html}</article>\n<p><a href=\"/\">Back</a></p>")
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Root-relative URL of a document, percent-encoded.
fn document_href(name: &str) -> String {
    format!("/{}", urlencoding::encode(name))
}

const LAYOUT: &str = r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>{{TITLE}}</title>
<style>
body{font-family:-apple-system,'Segoe UI',sans-serif;max-width:760px;margin:40px auto;padding:0 16px;color:#222;line-height:1.5}
a{color:#1a5fb4}
.flash{background:#fff4c2;border:1px solid #e5c100;padding:8px 12px;border-radius:4px}
form.inline{display:inline;margin-left:8px}
textarea{width:100%;min-height:360px;font-family:monospace}
ul.documents li{margin:4px 0}
.user-status{margin-top:24px;color:#555}
</style></head>
<body>
{{FLASH}}
{{BODY}}
</body></html>
"##;

const INDEX: &str = r#"<ul class="documents">
{{ITEMS}}</ul>
<p><a href="/new">New Document</a></p>
{{ACCOUNT}}"#;

const SIGNIN: &str = r#"<form method="post" action="/users/signin">
  <div><label for="username">Username</label>
  <input name="username" id="username" value="{{USERNAME}}"/></div>
  <div><label for="password">Password</label>
  <input type="password" name="password" id="password"/></div>
  <button type="submit">Sign In</button>
</form>"#;

const NEW_DOCUMENT: &str = r#"<form method="post" action="/create">
  <label for="filename">Add a new document:</label>
  <input name="filename" id="filename" value="{{FILENAME}}"/>
  <button type="submit">Create</button>
</form>"#;

const EDIT_DOCUMENT: &str = r#"<form method="post" action="{{ACTION}}">
  <label for="content">Edit content of {{NAME}}:</label>
  <textarea name="content" id="content">{{CONTENT}}</textarea>
  <button type="submit">Save Changes</button>
</form>"#;
