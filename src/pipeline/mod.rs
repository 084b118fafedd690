use std::collections::{HashMap, HashSet};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cli::{Cli, InputFormat};
use crate::error::{ExtractError, ParseWarning};
use crate::model::{
    ControlRecord, ControlSpan, ControlsDocument, ExtractionRule, Field, FieldCoverage, RunCounts,
    RunManifest, SourceInfo, TocEntry,
};
use crate::util::{
    collapse_whitespace, resolve_output_path, sha256_file, utc_compact_string, utc_string,
    write_json_pretty,
};

mod fields;
mod pool;
mod report;
mod run;
mod segment;
mod text_extract;
mod toc;

pub use run::run;

use fields::*;
use pool::*;
use report::*;
#[cfg(test)]
use run::*;
use segment::*;
use text_extract::*;
use toc::*;
