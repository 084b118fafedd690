use super::*;

/// Recoverable issues accumulated across every stage of a run.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub warnings: Vec<ParseWarning>,
    pub located_controls: usize,
}

impl ParseReport {
    pub fn extend(&mut self, warnings: impl IntoIterator<Item = ParseWarning>) {
        self.warnings.extend(warnings);
    }

    pub fn count_where(&self, predicate: impl Fn(&ParseWarning) -> bool) -> usize {
        self.warnings.iter().filter(|warning| predicate(*warning)).count()
    }

    pub fn missing_headings(&self) -> usize {
        self.count_where(|warning| matches!(warning, ParseWarning::HeadingNotFound { .. }))
    }

    pub fn worker_failures(&self) -> usize {
        self.count_where(|warning| matches!(warning, ParseWarning::WorkerFailure { .. }))
    }

    pub fn missing_field_count(&self, field: Field) -> usize {
        self.count_where(|warning| match warning {
            ParseWarning::MissingField { field: missing, .. } => *missing == field.label(),
            _ => false,
        })
    }

    /// Coverage over the controls whose heading was located.
    pub fn field_coverage(&self) -> Vec<FieldCoverage> {
        Field::ALL
            .iter()
            .map(|field| {
                let missing = self.missing_field_count(*field);
                FieldCoverage {
                    field: field.key().to_string(),
                    present: self.located_controls.saturating_sub(missing),
                    missing,
                }
            })
            .collect()
    }

    /// One line per issue class, e.g. `12/150 controls missing Audit section`.
    pub fn summary_lines(&self, total_controls: usize) -> Vec<String> {
        let mut lines = Vec::new();

        let duplicates =
            self.count_where(|warning| matches!(warning, ParseWarning::DuplicateTocId { .. }));
        if duplicates > 0 {
            lines.push(format!("{duplicates} duplicate toc ids dropped"));
        }

        let missing_headings = self.missing_headings();
        if missing_headings > 0 {
            lines.push(format!(
                "{missing_headings}/{total_controls} controls not located in body text"
            ));
        }

        let failures = self.worker_failures();
        if failures > 0 {
            lines.push(format!("{failures}/{total_controls} controls failed to parse"));
        }

        for field in Field::ALL {
            let missing = self.missing_field_count(field);
            if missing > 0 {
                lines.push(format!(
                    "{missing}/{} controls missing {} section",
                    self.located_controls,
                    field.label()
                ));
            }
        }

        lines
    }

    pub fn log_summary(&self, total_controls: usize) {
        let lines = self.summary_lines(total_controls);
        if lines.is_empty() {
            info!(controls = total_controls, "all controls parsed without warnings");
            return;
        }
        for line in lines {
            warn!("{line}");
        }
    }
}
