use crate::model::{RateLimitInfo, ScanResult};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Bytes")]
    bytes: usize,
}

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Extension")]
    extension: String,
    #[tabled(rename = "Files")]
    files: usize,
}

pub fn print_cli_table(result: &ScanResult) -> Result<()> {
    println!();
    println!(
        "Scanned {} ({}) at {}",
        result.repository.full_name(),
        result.git_ref.as_deref().unwrap_or("default branch"),
        result.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if result.files.is_empty() {
        println!("No source files found.");
        return Ok(());
    }

    println!("Found {} source files:", result.files.len());
    println!();

    let rows: Vec<FileRow> = result
        .files
        .iter()
        .map(|(path, content)| FileRow {
            path: truncate(path, 70),
            lines: content.lines().count(),
            bytes: content.len(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    print_summary(result);

    Ok(())
}

fn print_summary(result: &ScanResult) {
    let rows: Vec<ExtensionRow> = count_by_extension(result)
        .into_iter()
        .map(|(extension, files)| ExtensionRow { extension, files })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!(
        "Total: {} files, {} bytes",
        result.files.len(),
        result.total_bytes()
    );
}

fn count_by_extension(result: &ScanResult) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for path in result.files.keys() {
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        match counts.iter_mut().find(|(ext, _)| *ext == extension) {
            Some((_, count)) => *count += 1,
            None => counts.push((extension, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

pub fn print_rate_limit(info: &RateLimitInfo) {
    println!("Remaining: {}/{}", info.remaining, info.limit);
    println!(
        "Resets at: {}",
        info.reset_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RepoInfo, RepositoryLocator};
    use std::collections::BTreeMap;

    fn result(paths: &[&str]) -> ScanResult {
        let files: BTreeMap<String, String> = paths
            .iter()
            .map(|p| (p.to_string(), String::new()))
            .collect();
        ScanResult::new(
            RepoInfo::new(&RepositoryLocator::new("o", "r"), "o/r"),
            None,
            files,
        )
    }

    #[test]
    fn test_count_by_extension_sorted_by_count() {
        let counts = count_by_extension(&result(&["a.py", "b.py", "src/lib.rs", "web/app.ts"]));
        assert_eq!(
            counts,
            vec![
                (".py".to_string(), 2),
                (".rs".to_string(), 1),
                (".ts".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_truncate_keeps_path_tail() {
        assert_eq!(truncate("short.py", 20), "short.py");
        assert_eq!(truncate("very/long/path/to/file.py", 10), "...file.py");
    }
}
