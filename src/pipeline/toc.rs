use super::*;

/// Unmatched non-blank lines tolerated after the last entry before the scan
/// is considered to have left the table of contents.
const MAX_TOC_GAP_LINES: usize = 60;
/// Lines a wrapped title may span before its closing dot leaders.
const MAX_TITLE_CONTINUATIONS: usize = 3;

#[derive(Debug)]
pub struct TocExtraction {
    pub entries: Vec<TocEntry>,
    /// Byte offset just past the last line consumed as a TOC entry.
    pub body_offset: usize,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug)]
pub struct TocParser {
    toc_heading: Regex,
    entry_line: Regex,
    id_line: Regex,
    leader_tail: Regex,
}

#[derive(Debug)]
struct PendingEntry {
    id: String,
    title_parts: Vec<String>,
    continuations: usize,
}

impl TocParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            toc_heading: Regex::new(r"(?mi)^[ \t]*(?:table[ \t]+of[ \t]+)?contents[ \t]*$")
                .context("failed to compile toc heading regex")?,
            entry_line: Regex::new(r"^(\d+(?:\.\d+)*)\s+(.+?)\s*\.{2,}[\s.]*(\d*)\s*$")
                .context("failed to compile toc entry regex")?,
            id_line: Regex::new(r"^(\d+(?:\.\d+)*)\s+(\S.*)$")
                .context("failed to compile toc id regex")?,
            leader_tail: Regex::new(r"^(.*?)\s*\.{2,}[\s.]*(\d*)\s*$")
                .context("failed to compile toc leader regex")?,
        })
    }

    pub fn extract(&self, text: &str) -> Result<TocExtraction> {
        let start = self
            .toc_heading
            .find(text)
            .map(|heading| heading.end())
            .unwrap_or(0);

        let mut entries = Vec::<TocEntry>::new();
        let mut seen_ids = HashSet::<String>::new();
        let mut warnings = Vec::<ParseWarning>::new();
        let mut pending: Option<PendingEntry> = None;
        let mut body_offset = start;
        let mut gap_lines = 0usize;
        let mut offset = start;

        for raw_line in text[start..].split_inclusive('\n') {
            let line_end = offset + raw_line.len();
            offset = line_end;

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let completed = if let Some(captures) = self.entry_line.captures(line) {
                pending = None;
                Some((
                    captures[1].to_string(),
                    captures[2].to_string(),
                    captures[3].to_string(),
                ))
            } else if let Some(captures) = self.id_line.captures(line) {
                if seen_ids.contains(&captures[1]) {
                    debug!(id = %&captures[1], "toc id repeated without leaders; body reached");
                    break;
                }
                pending = Some(PendingEntry {
                    id: captures[1].to_string(),
                    title_parts: vec![captures[2].to_string()],
                    continuations: 0,
                });
                None
            } else if let Some(mut open) = pending.take() {
                if let Some(captures) = self.leader_tail.captures(line) {
                    open.title_parts.push(captures[1].to_string());
                    Some((open.id, open.title_parts.join(" "), captures[2].to_string()))
                } else {
                    open.continuations += 1;
                    open.title_parts.push(line.to_string());
                    if open.continuations <= MAX_TITLE_CONTINUATIONS {
                        pending = Some(open);
                    }
                    None
                }
            } else {
                None
            };

            let Some((id, title, page)) = completed else {
                if !entries.is_empty() {
                    gap_lines += 1;
                    if gap_lines >= MAX_TOC_GAP_LINES {
                        break;
                    }
                }
                continue;
            };

            gap_lines = 0;

            let title = collapse_whitespace(&title);
            if title.is_empty() {
                continue;
            }
            if !seen_ids.insert(id.clone()) {
                warn!(id = %id, "duplicate toc id");
                warnings.push(ParseWarning::DuplicateTocId { id });
                continue;
            }
            body_offset = line_end;

            entries.push(TocEntry {
                level: id.split('.').count(),
                page: page.parse::<u32>().ok(),
                id,
                title,
            });
        }

        if entries.is_empty() {
            return Err(ExtractError::EmptyToc.into());
        }

        debug!(
            entries = entries.len(),
            body_offset, "table of contents extracted"
        );

        Ok(TocExtraction {
            entries,
            body_offset,
            warnings,
        })
    }
}
