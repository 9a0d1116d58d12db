//! Repository queries must stay on Postgres syntax: `$n` placeholders only,
//! no SQLite leftovers.

use std::fs;
use std::path::{Path, PathBuf};

fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            rust_sources(&path, out);
        } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

/// The string literal passed to a `sqlx::query*` call starting at `idx`.
fn sql_literal(content: &str, idx: usize) -> Option<String> {
    let bytes = content.as_bytes();
    let mut i = idx + content[idx..].find('(')? + 1;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    // r#"..."# with any number of hashes
    if bytes.get(i) == Some(&b'r') {
        let mut j = i + 1;
        while bytes.get(j) == Some(&b'#') {
            j += 1;
        }
        if bytes.get(j) != Some(&b'"') {
            return None;
        }
        let hashes = j - (i + 1);
        let close = format!("\"{}", "#".repeat(hashes));
        let start = j + 1;
        let end = start + content[start..].find(&close)?;
        return Some(content[start..end].to_string());
    }

    if bytes.get(i) == Some(&b'"') {
        let start = i + 1;
        let mut j = start;
        while j < bytes.len() {
            match bytes[j] {
                b'\\' => j += 1,
                b'"' => return Some(content[start..j].to_string()),
                _ => {}
            }
            j += 1;
        }
    }

    None
}

fn check_sources(violation: impl Fn(&str) -> bool, label: &str) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut files = Vec::new();
    rust_sources(&root, &mut files);
    assert!(!files.is_empty(), "No sources found under {:?}", root);

    let mut bad = Vec::new();
    for file in files {
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        let mut pos = 0;
        while let Some(rel) = content[pos..].find("sqlx::query") {
            let idx = pos + rel;
            if let Some(sql) = sql_literal(&content, idx) {
                if violation(&sql) {
                    bad.push(format!("{}: {}", file.display(), sql.trim()));
                }
            }
            pos = idx + "sqlx::query".len();
        }
    }

    assert!(bad.is_empty(), "{}:\n{}", label, bad.join("\n"));
}

#[test]
fn queries_use_postgres_placeholders() {
    check_sources(
        |sql| sql.contains('?'),
        "Found '?' placeholders in sqlx query literals",
    );
}

#[test]
fn queries_avoid_sqlite_functions() {
    check_sources(
        |sql| {
            let lower = sql.to_lowercase();
            lower.contains("insert or ignore")
                || lower.contains("strftime(")
                || lower.contains("datetime(")
        },
        "Found SQLite-only syntax in sqlx query literals",
    );
}
