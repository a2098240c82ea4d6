//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use shortlink::net::types::{ShortenedUrl, UserAccount};
use shortlink::state::SortDirection;
use shortlink::{Claims, ErrorCode, ShortlinkApi};
use time::OffsetDateTime;
use time::macros::format_description;

const MAX_URL_WIDTH: usize = 48;

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self { headers: headers.iter().map(|h| (*h).to_owned()).collect(), rows: Vec::new() }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        write_row(&mut out, &self.headers, &widths);
        for row in &self.rows {
            write_row(&mut out, row, &widths);
        }
        out
    }
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// `YYYY-MM-DD`, or `-` when the backend sent no timestamp.
pub fn format_date(at: Option<OffsetDateTime>) -> String {
    let format = format_description!("[year]-[month]-[day]");
    at.and_then(|t| t.format(format).ok()).unwrap_or_else(|| "-".to_owned())
}

/// Shorten to `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

pub fn url_table(urls: &[&ShortenedUrl], api: &ShortlinkApi) -> String {
    if urls.is_empty() {
        return "No URLs found.\n".to_owned();
    }
    let mut table = Table::new(&["ID", "SHORT LINK", "ORIGINAL URL", "VISITS", "CREATED"]);
    for url in urls {
        table.push(vec![
            url.id.to_string(),
            api.short_link(&url.short_code),
            truncate(&url.original_url, MAX_URL_WIDTH),
            url.visit_count.to_string(),
            format_date(url.created_at),
        ]);
    }
    table.render()
}

/// Header line for the explorer naming the active sort.
pub fn sort_caption(field: &str, direction: SortDirection) -> String {
    format!("Sorted by {field} {}", direction.arrow())
}

pub fn url_detail(url: &ShortenedUrl, api: &ShortlinkApi) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", url.id);
    let _ = writeln!(out, "short link:  {}", api.short_link(&url.short_code));
    let _ = writeln!(out, "original:    {}", url.original_url);
    if !url.title.is_empty() {
        let _ = writeln!(out, "title:       {}", url.title);
    }
    let _ = writeln!(out, "visits:      {}", url.visit_count);
    let _ = writeln!(out, "created:     {}", format_date(url.created_at));
    if let Some(owner) = url.owner_id() {
        let _ = writeln!(out, "owner id:    {owner}");
    }
    if let Some(qr) = api.qr_link(url) {
        let _ = writeln!(out, "qr code:     {qr}");
    }
    out
}

pub fn user_table(users: &[UserAccount]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_owned();
    }
    let mut table = Table::new(&["ID", "NAME", "EMAIL", "ROLE", "STATUS", "LINKS"]);
    for user in users {
        table.push(vec![
            user.id.to_string(),
            user.display_name(),
            user.email.clone(),
            user.role.as_str().to_owned(),
            user.status_label().to_owned(),
            user.total_shortened_links.to_string(),
        ]);
    }
    table.render()
}

pub fn profile(user: &UserAccount) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "name:    {}", user.display_name());
    let _ = writeln!(out, "email:   {}", user.email);
    let _ = writeln!(out, "role:    {}", user.role.as_str());
    let _ = writeln!(out, "status:  {}", user.status_label());
    let _ = writeln!(out, "links:   {}", user.total_shortened_links);
    out
}

pub fn identity(claims: &Claims) -> String {
    let name = claims.username.as_deref().unwrap_or("unknown");
    match claims.email.as_deref() {
        Some(email) => format!("{name} <{email}> (id {}, {})", claims.user_id, claims.role.as_str()),
        None => format!("{name} (id {}, {})", claims.user_id, claims.role.as_str()),
    }
}

/// Whether the stored access token is still current at `now_secs`.
///
/// An expired token is not an error: the next request refreshes it.
pub fn token_status(claims: &Claims, now_secs: i64) -> &'static str {
    if claims.is_expired_at(now_secs) {
        "access token expired; it will be refreshed on the next request"
    } else {
        "access token current"
    }
}

/// One-line error with its stable code, e.g. `[E_NOT_FOUND] HTTP 404: ...`.
pub fn coded<E: ErrorCode>(err: &E) -> String {
    format!("[{}] {err}", err.error_code())
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
