use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// An address pulled out of a `From`/`To` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactAddress {
    pub email: String,
    pub display_name: Option<String>,
}

fn address_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:"?([^"<>,]*?)"?\s*<)?([A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,})"#)
            .expect("address pattern is valid")
    })
}

/// Extract every address in a header value, lowercased and de-duplicated in
/// order of first appearance.
///
/// Accepts bare addresses, `Name <addr>` and `"Name" <addr>` forms separated
/// by commas or whitespace. Anything that does not look like an address is
/// skipped.
pub fn extract_contact_addresses(raw: &str) -> Vec<ContactAddress> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for caps in address_pattern().captures_iter(raw) {
        let Some(email) = caps.get(2).map(|m| m.as_str().to_lowercase()) else {
            continue;
        };
        if !seen.insert(email.clone()) {
            continue;
        }

        let display_name = caps
            .get(1)
            .map(|m| m.as_str().trim().trim_matches('"').trim().to_string())
            .filter(|name| !name.is_empty());

        addresses.push(ContactAddress {
            email,
            display_name,
        });
    }

    addresses
}
