use super::*;

#[derive(Debug)]
pub struct FieldPattern {
    pub label: &'static str,
    /// `None` for headings that only end the preceding section.
    pub field: Option<Field>,
    pub heading: Regex,
    pub rule: ExtractionRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedControl {
    pub record: ControlRecord,
    pub missing: Vec<Field>,
}

#[derive(Debug)]
pub struct FieldParser {
    patterns: Vec<FieldPattern>,
    list_marker: Regex,
}

#[derive(Debug, Clone, Copy)]
struct HeadingHit {
    pattern_index: usize,
    start: usize,
    end: usize,
}

impl FieldParser {
    pub fn new() -> Result<Self> {
        let patterns = vec![
            field_pattern(Field::ProfileApplicability, &["Profile Applicability"], false)?,
            field_pattern(Field::Description, &["Description"], false)?,
            field_pattern(Field::Rationale, &["Rationale Statement", "Rationale"], false)?,
            field_pattern(Field::Impact, &["Impact Statement", "Impact"], false)?,
            field_pattern(Field::Audit, &["Audit Procedure", "Audit"], false)?,
            field_pattern(Field::Remediation, &["Remediation Procedure", "Remediation"], false)?,
            field_pattern(Field::DefaultValue, &["Default Values", "Default Value"], false)?,
            field_pattern(Field::References, &["References"], false)?,
            field_pattern(Field::CisControls, &["CIS Controls"], true)?,
            field_pattern(Field::AdditionalInformation, &["Additional Information"], false)?,
            FieldPattern {
                label: "MITRE ATT&CK Mappings",
                field: None,
                heading: heading_regex(&["MITRE ATT&CK Mappings"], false)?,
                rule: ExtractionRule::Text,
            },
        ];

        Ok(Self {
            patterns,
            list_marker: Regex::new(r"^(?:\d{1,3}[.)]|[•▪●◦\-*])\s+(.*)$")
                .context("failed to compile list marker regex")?,
        })
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }

    pub fn parse(&self, span: &ControlSpan, title: &str) -> ParsedControl {
        let mut record = ControlRecord::empty(&span.id, title);
        let hits = self.heading_hits(&span.raw_text);

        for (position, hit) in hits.iter().enumerate() {
            let pattern = &self.patterns[hit.pattern_index];
            let Some(field) = pattern.field else {
                continue;
            };

            let body_end = hits
                .get(position + 1)
                .map(|next| next.start)
                .unwrap_or(span.raw_text.len());
            let body = &span.raw_text[hit.end..body_end];

            match pattern.rule {
                ExtractionRule::Text => {
                    let text = collapse_whitespace(body);
                    if let Some(slot) = record.text_slot_mut(field)
                        && !text.is_empty()
                    {
                        *slot = Some(text);
                    }
                }
                ExtractionRule::List => {
                    let items = self.split_list_items(body);
                    if let Some(slot) = record.list_slot_mut(field)
                        && !items.is_empty()
                    {
                        *slot = Some(items);
                    }
                }
            }
        }

        let missing = Field::ALL
            .iter()
            .copied()
            .filter(|field| !record.has_field(*field))
            .collect();

        ParsedControl { record, missing }
    }

    /// Heading occurrences in span order. Only the first occurrence of each
    /// label counts; later repeats are body text of the enclosing section.
    fn heading_hits(&self, text: &str) -> Vec<HeadingHit> {
        let mut hits = Vec::<HeadingHit>::new();
        for (pattern_index, pattern) in self.patterns.iter().enumerate() {
            for found in pattern.heading.find_iter(text) {
                hits.push(HeadingHit {
                    pattern_index,
                    start: found.start(),
                    end: found.end(),
                });
            }
        }
        hits.sort_by_key(|hit| (hit.start, hit.pattern_index));

        let mut seen = HashSet::<usize>::new();
        let mut kept = Vec::<HeadingHit>::with_capacity(hits.len());
        for hit in hits {
            if kept.last().is_some_and(|last| hit.start < last.end) {
                continue;
            }
            if seen.insert(hit.pattern_index) {
                kept.push(hit);
            }
        }
        kept
    }

    fn split_list_items(&self, body: &str) -> Vec<String> {
        let lines = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();

        if !lines.iter().any(|line| self.list_marker.is_match(line)) {
            return lines.into_iter().map(collapse_whitespace).collect();
        }

        let mut items = Vec::<String>::new();
        for line in lines {
            if let Some(captures) = self.list_marker.captures(line) {
                items.push(collapse_whitespace(&captures[1]));
                continue;
            }

            match items.last_mut() {
                Some(item) => append_continuation(item, line),
                None => items.push(collapse_whitespace(line)),
            }
        }

        items.retain(|item| !item.is_empty());
        items
    }
}

fn field_pattern(field: Field, variants: &[&str], bare_line: bool) -> Result<FieldPattern> {
    Ok(FieldPattern {
        label: field.label(),
        field: Some(field),
        heading: heading_regex(variants, bare_line)?,
        rule: field.rule(),
    })
}

/// Line-anchored, case-insensitive heading. `bare_line` also accepts the
/// label alone on its line without a colon.
fn heading_regex(variants: &[&str], bare_line: bool) -> Result<Regex> {
    let alternatives = variants
        .iter()
        .map(|variant| {
            variant
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<String>>()
                .join(r"[ \t]+")
        })
        .collect::<Vec<String>>()
        .join("|");
    let terminator = if bare_line { r"(?::|$)" } else { ":" };

    Regex::new(&format!(r"(?mi)^[ \t]*(?:{alternatives})[ \t]*{terminator}"))
        .with_context(|| format!("failed to compile heading regex for {}", variants.join("/")))
}

/// Continuation of a wrapped item. A URL split across lines rejoins without
/// a space.
fn append_continuation(item: &mut String, line: &str) {
    let line = collapse_whitespace(line);
    let wrapped_url = item
        .rsplit(' ')
        .next()
        .is_some_and(|token| token.starts_with("http"))
        && !line.contains(' ');

    if !wrapped_url && !item.is_empty() {
        item.push(' ');
    }
    item.push_str(&line);
}
