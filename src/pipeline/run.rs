use std::panic::{self, AssertUnwindSafe};

use super::*;

const MANIFEST_VERSION: u32 = 1;

pub fn run(cli: Cli) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));
    let pool = cli
        .workers
        .map(WorkerPool::new)
        .unwrap_or_else(WorkerPool::from_available_parallelism);
    let output_path = resolve_output_path(&cli.input, &cli.output);

    info!(
        run_id = %run_id,
        input = %cli.input.display(),
        output = %output_path.display(),
        workers = pool.workers(),
        "starting cis benchmark parse"
    );

    let extraction = load_document_text(&cli.input, cli.input_format, cli.max_pages)
        .context("text extraction stage failed")?;
    let text = extraction.full_text();

    let (document, report) = parse_document(&text, &pool)?;

    write_json_pretty(&output_path, &document)?;
    info!(
        path = %output_path.display(),
        controls = document.controls.len(),
        "wrote controls json"
    );

    report.log_summary(document.controls.len());

    if let Some(manifest_path) = cli.manifest_path.as_deref() {
        let manifest = RunManifest {
            manifest_version: MANIFEST_VERSION,
            run_id,
            started_at: utc_string(started_ts),
            completed_at: utc_string(Utc::now()),
            source: SourceInfo {
                path: cli.input.display().to_string(),
                input_format: extraction
                    .input_format
                    .unwrap_or(cli.input_format)
                    .as_str()
                    .to_string(),
                sha256: sha256_file(&cli.input)?,
                page_count: extraction.pages.len(),
            },
            output_path: output_path.display().to_string(),
            workers: pool.workers(),
            counts: RunCounts {
                toc_entries: document.controls.len(),
                spans_located: report.located_controls,
                spans_missing: report.missing_headings(),
                records: document.controls.len(),
                worker_failures: report.worker_failures(),
                header_lines_removed: extraction.header_lines_removed,
                footer_lines_removed: extraction.footer_lines_removed,
                dehyphenation_merges: extraction.dehyphenation_merges,
            },
            field_coverage: report.field_coverage(),
            warnings: report
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    Ok(())
}

/// Runs TOC extraction, segmentation and field parsing over normalized
/// document text. Fails only when no TOC entries are recognized.
pub fn parse_document(text: &str, pool: &WorkerPool) -> Result<(ControlsDocument, ParseReport)> {
    let toc = TocParser::new()?
        .extract(text)
        .context("toc extraction stage failed")?;
    info!(
        entries = toc.entries.len(),
        duplicates = toc.warnings.len(),
        "table of contents extracted"
    );

    let mut report = ParseReport::default();
    report.extend(toc.warnings);

    let segments = Segmenter::new()?
        .segment(text, &toc.entries, toc.body_offset)
        .context("segmentation stage failed")?;
    report.located_controls = segments.spans.iter().filter(|span| span.is_located()).count();
    report.extend(segments.warnings);
    info!(
        located = report.located_controls,
        missing = toc.entries.len() - report.located_controls,
        "control spans segmented"
    );

    let parser = FieldParser::new()?;
    debug!(
        labels = ?parser.patterns().iter().map(|pattern| pattern.label).collect::<Vec<_>>(),
        "field pattern table compiled"
    );

    let jobs = toc
        .entries
        .iter()
        .zip(segments.spans.iter())
        .collect::<Vec<(&TocEntry, &ControlSpan)>>();
    let outcomes = pool.map(&jobs, |&(entry, span)| {
        parse_control_isolated(&parser, entry, span)
    })?;

    let mut controls = Vec::with_capacity(outcomes.len());
    for ((_, span), outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Ok(parsed) => {
                if span.is_located() {
                    report.extend(parsed.missing.iter().map(|field| ParseWarning::MissingField {
                        id: parsed.record.id.clone(),
                        field: field.label(),
                    }));
                }
                controls.push(parsed.record);
            }
            Err(failure) => {
                warn!(id = %failure.record.id, reason = %failure.reason, "control parse failed");
                report.extend([ParseWarning::WorkerFailure {
                    id: failure.record.id.clone(),
                    reason: failure.reason,
                }]);
                controls.push(failure.record);
            }
        }
    }

    Ok((ControlsDocument { controls }, report))
}

#[derive(Debug)]
pub struct ControlFailure {
    pub record: ControlRecord,
    pub reason: String,
}

/// A panic inside one control's parse yields an id/title-only record instead
/// of taking down the other workers.
pub fn parse_control_isolated(
    parser: &FieldParser,
    entry: &TocEntry,
    span: &ControlSpan,
) -> std::result::Result<ParsedControl, ControlFailure> {
    parse_isolated(entry, || parser.parse(span, &entry.title))
}

pub fn parse_isolated<F>(
    entry: &TocEntry,
    parse: F,
) -> std::result::Result<ParsedControl, ControlFailure>
where
    F: FnOnce() -> ParsedControl,
{
    panic::catch_unwind(AssertUnwindSafe(parse)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ControlFailure {
            record: ControlRecord::empty(&entry.id, &entry.title),
            reason,
        }
    })
}
