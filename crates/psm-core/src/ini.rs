// Minimal line scanner for INI-style files.
// Only what the server files and the tool config need: find one key inside
// one section, and render a single section back out.
use std::fs;
use std::io;
use std::path::Path;

/// Returns the value of `key` inside `[section]`, or `None` when the key is
/// absent or empty. Values are trimmed; keys match by prefix followed by
/// optional whitespace and `=`.
pub fn find_value(text: &str, section: &str, key: &str) -> Option<String> {
    let header = format!("[{}]", section);
    let mut inside = false;
    for raw in text.lines() {
        let line = raw.trim();
        if line.starts_with('[') && line.ends_with(']') {
            inside = line == header;
            continue;
        }
        if !inside {
            continue;
        }
        let Some(rest) = line.strip_prefix(key) else {
            continue;
        };
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        let value = value.trim();
        return if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
    None
}

/// `find_value` over a file. A missing file is not an error.
pub fn read_value(path: &Path, section: &str, key: &str) -> io::Result<Option<String>> {
    match fs::read(path) {
        Ok(data) => Ok(find_value(&String::from_utf8_lossy(&data), section, key)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn render_section(section: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = format!("[{}]\n", section);
    for (k, v) in pairs {
        out.push_str(k);
        out.push_str(" = ");
        out.push_str(v);
        out.push('\n');
    }
    out.push('\n');
    out
}
