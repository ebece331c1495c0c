//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per physical line, excluding the line break.
const MAX_OCTETS: usize = 75;

/// Folds one logical line at 75 octets, inserting `CRLF + SPACE` at
/// UTF-8 boundaries. The continuation space counts toward the next
/// line's budget.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_OCTETS * 3);
    let mut budget = MAX_OCTETS;
    let mut used = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > budget {
            out.push_str("\r\n ");
            budget = MAX_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += width;
    }

    out
}
