//! Log sanitization utilities
//!
//! User-supplied text (search terms, service names, driver messages) goes
//! through [`truncate_for_log`] before it reaches a log line. Secrets are
//! never passed here; they are not logged at all.

/// Characters kept before truncating.
const TRUNCATE_LIMIT: usize = 256;

/// Single-line, bounded rendering of `s` for logs.
///
/// Control characters (newlines included) are escaped so that input cannot
/// forge extra log lines. Longer values keep their first `TRUNCATE_LIMIT`
/// characters followed by the total character count.
pub fn truncate_for_log(s: &str) -> String {
    let total = s.chars().count();
    let mut out = String::with_capacity(s.len().min(TRUNCATE_LIMIT * 4));
    for c in s.chars().take(TRUNCATE_LIMIT) {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    if total > TRUNCATE_LIMIT {
        out.push_str(&format!("... [truncated, {total} chars]"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_for_log("gmail"), "gmail");
    }

    #[test]
    fn limit_is_counted_in_chars() {
        let s = "é".repeat(TRUNCATE_LIMIT);
        assert_eq!(truncate_for_log(&s), s);

        let s = "é".repeat(TRUNCATE_LIMIT + 1);
        let result = truncate_for_log(&s);
        assert!(result.ends_with(&format!("[truncated, {} chars]", TRUNCATE_LIMIT + 1)));
        assert!(result.starts_with(&"é".repeat(TRUNCATE_LIMIT)));
    }

    #[test]
    fn newlines_cannot_forge_log_lines() {
        let result = truncate_for_log("gmail\nERROR fake entry");
        assert_eq!(result, "gmail\\nERROR fake entry");
    }
}
