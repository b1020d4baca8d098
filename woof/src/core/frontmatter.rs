//! Minimal `---` delimited frontmatter for task files.
//!
//! Only flat `key: value` lines are understood. Unknown keys are preserved
//! verbatim when a document is updated.

/// Split a document into (frontmatter, rest). Returns None if it doesn't start with frontmatter.
pub fn split(contents: &str) -> Option<(&str, &str)> {
    let after = contents
        .strip_prefix("---\n")
        .or_else(|| contents.strip_prefix("---\r\n"))?;
    if let Some(rest) = after.strip_prefix("---\n") {
        return Some(("", rest));
    }
    let end = after.find("\n---")?;
    let frontmatter = &after[..end];
    let rest = &after[end + 4..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    Some((frontmatter, rest))
}

/// Document body with any frontmatter removed.
pub fn body(contents: &str) -> &str {
    split(contents).map_or(contents, |(_, rest)| rest)
}

/// Value of `key`, unquoted, or None when absent or empty.
pub fn get(contents: &str, key: &str) -> Option<String> {
    let (frontmatter, _) = split(contents)?;
    for line in frontmatter.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((k, value)) = trimmed.split_once(':') else {
            continue;
        };
        if k.trim() != key {
            continue;
        }
        let value = unquote(value.trim());
        if value.is_empty() {
            return None;
        }
        return Some(value.to_string());
    }
    None
}

/// Parse `[a, b]` or `a, b` into trimmed, unquoted, non-empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    let inner = value
        .trim()
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Render a list in inline form.
pub fn format_list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// Set each `(key, value)` pair, inserting missing keys at the end and
/// creating the frontmatter block when the document has none.
pub fn upsert(contents: &str, updates: &[(&str, &str)]) -> String {
    let (frontmatter, rest) = split(contents).unwrap_or(("", contents));
    let mut lines: Vec<String> = Vec::new();
    let mut applied = vec![false; updates.len()];

    for line in frontmatter.lines() {
        let key = line.split_once(':').map(|(k, _)| k.trim());
        match key.and_then(|k| updates.iter().position(|(u, _)| *u == k)) {
            Some(idx) if applied[idx] => continue,
            Some(idx) => {
                let (k, v) = updates[idx];
                lines.push(format!("{k}: {v}"));
                applied[idx] = true;
            }
            None => lines.push(line.to_string()),
        }
    }
    for (idx, (k, v)) in updates.iter().enumerate() {
        if !applied[idx] {
            lines.push(format!("{k}: {v}"));
        }
    }

    render(&lines.join("\n"), rest)
}

fn render(frontmatter: &str, rest: &str) -> String {
    let mut buf = String::new();
    buf.push_str("---\n");
    buf.push_str(frontmatter.trim_end());
    buf.push('\n');
    buf.push_str("---\n\n");
    buf.push_str(rest.trim_start_matches('\n'));
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
