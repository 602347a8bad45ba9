//! Turns a raw workflow response into display markdown: the supervisor line in
//! bold and one `###` section per domain that answered.

use super::supervisor::SUPERVISOR_MARKER;
use crate::types::Domain;

/// Section boundaries checked, in order, when cutting a domain's content.
/// The first boundary present wins.
fn boundaries(domain: Domain) -> [&'static str; 2] {
    match domain {
        Domain::DemandForecasting => ["\n\n📦", "\n\n💰"],
        Domain::InventoryMonitoring => ["\n\n📊", "\n\n💰"],
        Domain::PriceOptimization => ["\n\n📊", "\n\n📦"],
    }
}

/// Text following the first occurrence of `marker`, up to any second occurrence.
fn after_marker<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    let mut parts = raw.split(marker);
    parts.next()?;
    parts.next()
}

fn section_content(raw: &str, domain: Domain) -> Option<String> {
    let mut content = after_marker(raw, domain.response_header())?;
    if let Some(boundary) = boundaries(domain).into_iter().find(|b| content.contains(*b)) {
        content = content.split(boundary).next().unwrap_or(content);
    }
    Some(content.trim().to_string())
}

pub fn format_response(raw: &str) -> String {
    let mut formatted_parts: Vec<String> = Vec::new();

    if raw.contains(SUPERVISOR_MARKER) {
        if let Some(part) = raw.split("\n\n").find(|p| p.contains(SUPERVISOR_MARKER)) {
            formatted_parts.push(format!("**{}**\n", part.trim()));
        }
    }

    for domain in Domain::ALL {
        if let Some(content) = section_content(raw, domain) {
            formatted_parts.push(format!("### {}\n{}", domain.display_title(), content));
        }
    }

    if formatted_parts.is_empty() {
        return raw.to_string();
    }

    formatted_parts.join("\n\n")
}
