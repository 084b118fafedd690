use super::*;

#[derive(Debug)]
pub struct SegmentResult {
    /// One span per TOC entry, in TOC order.
    pub spans: Vec<ControlSpan>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug)]
pub struct Segmenter {
    terminal_marker: Regex,
    toc_leader: Regex,
}

#[derive(Debug)]
struct HeadingPatterns {
    exact: Option<Regex>,
    loose: Regex,
}

#[derive(Debug, Clone, Copy)]
struct HeadingMatch {
    start: usize,
    end: usize,
}

impl Segmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal_marker: Regex::new(
                r"(?mi)^[ \t]*Appendix[ \t]*:?[ \t]*(?:Summary[ \t]+Table|(?:Recommendation[ \t]+)?Change[ \t]+History)[ \t]*$",
            )
            .context("failed to compile appendix marker regex")?,
            toc_leader: Regex::new(r"\.{2,}[\s.]*\d*\s*$")
                .context("failed to compile dot leader regex")?,
        })
    }

    pub fn segment(
        &self,
        text: &str,
        entries: &[TocEntry],
        body_offset: usize,
    ) -> Result<SegmentResult> {
        let body_offset = floor_char_boundary(text, body_offset);
        let patterns = entries
            .iter()
            .map(heading_patterns)
            .collect::<Result<Vec<_>>>()?;

        let mut limit = self
            .terminal_marker
            .find_at(text, body_offset)
            .map(|marker| marker.start())
            .unwrap_or(text.len());
        let mut starts = self.locate_headings(text, &patterns, body_offset, limit);

        // Some benchmarks carry the full control text after the appendix marker.
        if limit < text.len() && starts.iter().all(Option::is_none) {
            debug!(marker_offset = limit, "no headings before appendix marker; scanning to end");
            limit = text.len();
            starts = self.locate_headings(text, &patterns, body_offset, limit);
        }

        let mut spans = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let raw_text = match starts[index] {
                Some(start) => {
                    let end = starts[index + 1..]
                        .iter()
                        .flatten()
                        .next()
                        .copied()
                        .unwrap_or(limit);
                    text[start..end].to_string()
                }
                None => {
                    warn!(id = %entry.id, "control heading not found in body text");
                    warnings.push(ParseWarning::HeadingNotFound {
                        id: entry.id.clone(),
                    });
                    String::new()
                }
            };

            spans.push(ControlSpan {
                id: entry.id.clone(),
                raw_text,
            });
        }

        Ok(SegmentResult { spans, warnings })
    }

    /// Heading start offsets aligned with `patterns`. The cursor only moves
    /// forward, so ids quoted earlier in prose are never revisited.
    fn locate_headings(
        &self,
        text: &str,
        patterns: &[HeadingPatterns],
        body_offset: usize,
        limit: usize,
    ) -> Vec<Option<usize>> {
        let mut cursor = body_offset;
        let mut starts = Vec::with_capacity(patterns.len());

        for (index, pattern) in patterns.iter().enumerate() {
            let exact = pattern
                .exact
                .as_ref()
                .and_then(|regex| self.find_heading(regex, text, cursor, limit));
            let loose = self.find_heading(&pattern.loose, text, cursor, limit);

            let chosen = match (exact, loose) {
                (Some(exact), Some(loose)) if loose.start < exact.start => {
                    // An exact match beyond the next control's heading means the
                    // title was reflowed here and only repeats further on.
                    let next_heading = patterns
                        .get(index + 1)
                        .and_then(|next| self.find_heading(&next.loose, text, loose.end, limit));
                    match next_heading {
                        Some(next) if next.start < exact.start => Some(loose),
                        _ => Some(exact),
                    }
                }
                (Some(exact), _) => Some(exact),
                (None, loose) => loose,
            };

            match chosen {
                Some(found) => {
                    cursor = found.end;
                    starts.push(Some(found.start));
                }
                None => starts.push(None),
            }
        }

        starts
    }

    fn find_heading(
        &self,
        regex: &Regex,
        text: &str,
        from: usize,
        limit: usize,
    ) -> Option<HeadingMatch> {
        let mut position = from;
        while position < limit {
            let found = regex.find_at(text, position)?;
            if found.start() >= limit {
                return None;
            }

            let line_end = text[found.end()..]
                .find('\n')
                .map(|offset| found.end() + offset)
                .unwrap_or(text.len());
            if self.toc_leader.is_match(&text[found.start()..line_end]) {
                position = line_end;
                continue;
            }

            return Some(HeadingMatch {
                start: found.start(),
                end: found.end(),
            });
        }

        None
    }
}

fn heading_patterns(entry: &TocEntry) -> Result<HeadingPatterns> {
    let id = regex::escape(&entry.id);
    let loose = Regex::new(&format!(r"(?m)^[ \t]*{id}[ \t]+\S"))
        .with_context(|| format!("failed to compile heading regex for {}", entry.id))?;

    let title_words = entry
        .title
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<String>>();
    let exact = if title_words.is_empty() {
        None
    } else {
        match Regex::new(&format!(
            r"(?m)^[ \t]*{id}\s+{}(?:[ \t]|$)",
            title_words.join(r"\s+")
        )) {
            Ok(regex) => Some(regex),
            Err(error) => {
                debug!(id = %entry.id, error = %error, "title heading regex unavailable");
                None
            }
        }
    };

    Ok(HeadingPatterns { exact, loose })
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
