//! Per-category ticket numbering.
//!
//! Ticket ids take the form `<CATEGORY>-<YEAR>-<NNN>`. The counter is the
//! only state shared between pipeline runs; it is append-only and guarded
//! by a mutex so concurrent runs for the same category never reuse a number.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Issues sequential ticket ids per (category slug, year)
#[derive(Debug, Default)]
pub struct TicketSequencer {
    counters: Mutex<HashMap<(String, i32), u32>>,
}

impl TicketSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next ticket id for a category and event year
    pub fn next_id(&self, category: &str, year: i32) -> String {
        let slug = category_slug(category);
        let sequence = {
            let mut counters = self.counters.lock();
            let counter = counters.entry((slug.clone(), year)).or_insert(0);
            *counter += 1;
            *counter
        };

        format!("{}-{}-{:03}", slug, year, sequence)
    }
}

/// Upper-case a category, collapsing separators other than `-` to `-`
///
/// `"Wi-Fi"` becomes `"WI-FI"`, `"Mobile App"` becomes `"MOBILE-APP"`.
pub fn category_slug(category: &str) -> String {
    let mut slug = String::with_capacity(category.len());
    let mut pending_dash = false;

    for ch in category.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_uppercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "GENERAL".to_string()
    } else {
        slug
    }
}
