use super::*;

#[derive(Debug, Default)]
pub struct ExtractedText {
    pub pages: Vec<String>,
    pub input_format: Option<InputFormat>,
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub noise_lines_removed: usize,
    pub dehyphenation_merges: usize,
}

impl ExtractedText {
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

pub fn load_document_text(
    path: &Path,
    input_format: InputFormat,
    max_pages: Option<usize>,
) -> Result<ExtractedText> {
    let resolved = resolve_input_format(path, input_format);
    let mut pages = match resolved {
        InputFormat::Text => read_text_pages(path)?,
        InputFormat::Pdf | InputFormat::Auto => extract_pages_with_pdftotext(path, max_pages)?,
    };
    if let Some(max_pages) = max_pages {
        pages.truncate(max_pages);
    }

    if pages.iter().all(|page| non_whitespace_char_count(page) == 0) {
        return Err(ExtractError::EmptyText {
            path: path.display().to_string(),
        }
        .into());
    }

    let mut extraction = ExtractedText {
        pages,
        input_format: Some(resolved),
        ..ExtractedText::default()
    };
    apply_page_normalization(&mut extraction)?;

    info!(
        path = %path.display(),
        format = resolved.as_str(),
        pages = extraction.pages.len(),
        header_lines_removed = extraction.header_lines_removed,
        footer_lines_removed = extraction.footer_lines_removed,
        noise_lines_removed = extraction.noise_lines_removed,
        dehyphenation_merges = extraction.dehyphenation_merges,
        "extracted document text"
    );

    Ok(extraction)
}

pub fn resolve_input_format(path: &Path, requested: InputFormat) -> InputFormat {
    if requested != InputFormat::Auto {
        return requested;
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt") | Some("text") => InputFormat::Text,
        _ => InputFormat::Pdf,
    }
}

fn read_text_pages(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path).map_err(|error| ExtractError::TextExtraction {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;
    Ok(split_pages(&raw))
}

fn extract_pages_with_pdftotext(pdf_path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command.output().map_err(|error| ExtractError::TextExtraction {
        path: pdf_path.display().to_string(),
        reason: format!("failed to execute pdftotext: {error}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(ExtractError::TextExtraction {
            path: pdf_path.display().to_string(),
            reason: format!("pdftotext exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// Split on form feeds, dropping NULs and trailing blank pages.
pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', "").replace("\r\n", "\n"))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

pub fn apply_page_normalization(extraction: &mut ExtractedText) -> Result<()> {
    let footer_noise = Regex::new(
        r"(?i)^\s*(?:page\s+(\d+)(?:\s+of\s+\d+)?|(\d+)\s*\|\s*p\s*a\s*g\s*e)\s*$",
    )
    .context("failed to compile page footer regex")?;
    let bare_page_number =
        Regex::new(r"^\s*(\d{1,4})\s*$").context("failed to compile page number regex")?;

    let header_candidates = detect_repeated_edge_lines(&extraction.pages, true);
    let footer_candidates = detect_repeated_edge_lines(&extraction.pages, false);
    let numbering_offsets =
        detect_page_numbering_offsets(&extraction.pages, &footer_noise, &bare_page_number);

    for (page_index, page) in extraction.pages.iter_mut().enumerate() {
        let mut lines = page
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect::<Vec<String>>();

        let before = lines.len();
        lines.retain(|line| !footer_noise.is_match(line));
        if lines.len() == before
            && let Some(index) = last_nonempty_line_index(&lines)
            && let Some(number) = captured_number(&bare_page_number, &lines[index])
            && numbering_offsets.contains(&(number - page_index as i64))
        {
            lines.remove(index);
        }
        extraction.noise_lines_removed += before - lines.len();

        if let Some(index) = first_nonempty_line_index(&lines) {
            let candidate = normalize_edge_line(&lines[index]);
            if header_candidates.contains(&candidate) {
                lines.remove(index);
                extraction.header_lines_removed += 1;
            }
        }

        if let Some(index) = last_nonempty_line_index(&lines) {
            let candidate = normalize_edge_line(&lines[index]);
            if footer_candidates.contains(&candidate) {
                lines.remove(index);
                extraction.footer_lines_removed += 1;
            }
        }

        let (merged, merges) = merge_hyphenated_lines(lines);
        extraction.dehyphenation_merges += merges;
        *page = merged.join("\n");
    }

    Ok(())
}

/// Offsets between printed page numbers and page positions. Footers such as
/// `Page 16` establish an offset directly; a trailing bare number only counts
/// when the same offset repeats on at least two pages.
fn detect_page_numbering_offsets(
    pages: &[String],
    footer_noise: &Regex,
    bare_page_number: &Regex,
) -> HashSet<i64> {
    let mut offsets = HashSet::<i64>::new();
    let mut bare_counts = HashMap::<i64, usize>::new();

    for (page_index, page) in pages.iter().enumerate() {
        let footer_numbers = page
            .lines()
            .filter_map(|line| captured_number(footer_noise, line))
            .collect::<Vec<i64>>();
        if !footer_numbers.is_empty() {
            offsets.extend(footer_numbers.iter().map(|number| number - page_index as i64));
            continue;
        }

        let trailing = page.lines().rev().find(|line| !line.trim().is_empty());
        if let Some(number) = trailing.and_then(|line| captured_number(bare_page_number, line)) {
            *bare_counts.entry(number - page_index as i64).or_insert(0) += 1;
        }
    }

    offsets.extend(
        bare_counts
            .into_iter()
            .filter_map(|(offset, count)| (count >= 2).then_some(offset)),
    );
    offsets
}

fn captured_number(pattern: &Regex, line: &str) -> Option<i64> {
    let captures = pattern.captures(line)?;
    captures
        .iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|group| group.as_str().parse::<i64>().ok())
}

/// Edge lines repeated on at least half the pages (and at least three).
fn detect_repeated_edge_lines(pages: &[String], header: bool) -> HashSet<String> {
    let threshold = (pages.len() / 2).max(3);
    let mut counts = HashMap::<String, usize>::new();

    for page in pages {
        let lines = page.lines().map(str::trim).collect::<Vec<&str>>();
        let candidate = if header {
            lines.iter().copied().find(|line| !line.is_empty())
        } else {
            lines.iter().rev().copied().find(|line| !line.is_empty())
        };

        let Some(candidate) = candidate else {
            continue;
        };
        if looks_structural(candidate) {
            continue;
        }

        let normalized = normalize_edge_line(candidate);
        if normalized.is_empty() || normalized.len() > 120 {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| (count >= threshold).then_some(candidate))
        .collect()
}

/// Field labels and control headings must never be stripped as page furniture.
fn looks_structural(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.ends_with(':')
        || trimmed
            .split_whitespace()
            .next()
            .map(|token| token.contains('.') && token.split('.').all(is_numeric_component))
            .unwrap_or(false)
}

fn is_numeric_component(component: &str) -> bool {
    !component.is_empty() && component.chars().all(|character| character.is_ascii_digit())
}

fn normalize_edge_line(input: &str) -> String {
    collapse_whitespace(input).to_ascii_lowercase()
}

fn first_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| !line.trim().is_empty())
}

fn last_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().rposition(|line| !line.trim().is_empty())
}

pub fn merge_hyphenated_lines(lines: Vec<String>) -> (Vec<String>, usize) {
    let mut merged = Vec::<String>::with_capacity(lines.len());
    let mut merges = 0usize;
    let mut iter = lines.into_iter().peekable();

    while let Some(current) = iter.next() {
        if let Some(next) = iter.peek() {
            if should_merge_hyphenated_pair(&current, next) {
                let joined = format!(
                    "{}{}",
                    current.trim_end().trim_end_matches('-'),
                    next.trim_start()
                );
                iter.next();
                merged.push(joined);
                merges += 1;
                continue;
            }
        }
        merged.push(current);
    }

    (merged, merges)
}

fn should_merge_hyphenated_pair(current: &str, next: &str) -> bool {
    let left = current.trim_end();
    if !left.ends_with('-') || left.ends_with("--") {
        return false;
    }

    let right = next.trim_start();
    let starts_with_lowercase = right
        .chars()
        .next()
        .map(|character| character.is_ascii_lowercase())
        .unwrap_or(false);
    if !starts_with_lowercase {
        return false;
    }

    left.trim_end_matches('-')
        .chars()
        .last()
        .map(|character| character.is_ascii_alphabetic())
        .unwrap_or(false)
}
