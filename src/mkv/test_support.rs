//! Scripted tool runner for extraction tests.
//!
//! Dispatches on the argument shape the real tools are invoked with:
//! `-J <file>` is a probe, `<file> tracks|attachments id:path` writes the
//! named output files, `<file> chapters --redirect-output <path>` writes a
//! chapter document, and a bare `<file>` is a mediainfo report.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;

use super::tools::{ToolOutput, ToolRunner};

pub(crate) struct FakeToolRunner {
    default_probe_json: String,
    probe_overrides: Mutex<HashMap<String, String>>,
    failing_probes: Mutex<HashSet<String>>,
    failing_ids: Mutex<HashSet<u64>>,
    fail_chapters: Mutex<bool>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeToolRunner {
    /// One video track, one SRT subtitle with a language, one ASS subtitle
    /// without one.
    pub(crate) const TWO_SUBS_JSON: &'static str = r#"{
        "tracks": [
            {"id": 0, "type": "video", "codec": "AVC/H.264/MPEG-4p10"},
            {"id": 2, "type": "subtitles", "codec": "SubRip/SRT", "properties": {"language": "eng"}},
            {"id": 3, "type": "subtitles", "codec": "SubStationAlpha", "properties": {}}
        ],
        "attachments": [],
        "chapters": []
    }"#;

    /// Container with nothing to extract
    pub(crate) const BARE_JSON: &'static str =
        r#"{"tracks": [], "attachments": [], "chapters": []}"#;

    /// One named font attachment, one nameless image attachment
    pub(crate) const ATTACHMENTS_JSON: &'static str = r#"{
        "tracks": [],
        "attachments": [
            {"id": 1, "file_name": "OpenSans.ttf", "content_type": "font/ttf"},
            {"id": 2, "content_type": "image/png"}
        ],
        "chapters": []
    }"#;

    /// Chapters only
    pub(crate) const CHAPTERS_JSON: &'static str =
        r#"{"tracks": [], "attachments": [], "chapters": [{"num_entries": 7}]}"#;

    pub(crate) fn new(default_probe_json: &str) -> Self {
        Self {
            default_probe_json: default_probe_json.to_string(),
            probe_overrides: Mutex::new(HashMap::new()),
            failing_probes: Mutex::new(HashSet::new()),
            failing_ids: Mutex::new(HashSet::new()),
            fail_chapters: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Use a different probe document for one specific file
    pub(crate) fn set_probe_json(&self, file: &str, json: &str) {
        self.probe_overrides
            .lock()
            .unwrap()
            .insert(file.to_string(), json.to_string());
    }

    /// Make the probe of one specific file fail
    pub(crate) fn fail_probe(&self, file: &str) {
        self.failing_probes.lock().unwrap().insert(file.to_string());
    }

    /// Make every extraction of the given track/attachment id fail
    pub(crate) fn fail_id(&self, id: u64) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    /// Make chapter extraction fail
    pub(crate) fn fail_chapters(&self) {
        *self.fail_chapters.lock().unwrap() = true;
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn ok(stdout: &str) -> ToolOutput {
        ToolOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failed(stderr: &str) -> ToolOutput {
        ToolOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl ToolRunner for FakeToolRunner {
    async fn run(&self, _program: &Path, args: &[String]) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(args.to_vec());

        if args.first().map(String::as_str) == Some("-J") {
            let file = args.get(1).cloned().unwrap_or_default();
            if self.failing_probes.lock().unwrap().contains(&file) {
                return Ok(Self::failed("corrupt container"));
            }
            let overrides = self.probe_overrides.lock().unwrap();
            let json = overrides
                .get(&file)
                .cloned()
                .unwrap_or_else(|| self.default_probe_json.clone());
            return Ok(Self::ok(&json));
        }

        match args.get(1).map(String::as_str) {
            Some("tracks") | Some("attachments") => {
                for spec in &args[2..] {
                    let (id, path) = spec.split_once(':').unwrap();
                    let id: u64 = id.parse().unwrap();
                    if self.failing_ids.lock().unwrap().contains(&id) {
                        return Ok(Self::failed("extraction failed"));
                    }
                    let path = Path::new(path);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).unwrap();
                    }
                    std::fs::write(path, b"extracted").unwrap();
                }
                Ok(Self::ok(""))
            }
            Some("chapters") => {
                if *self.fail_chapters.lock().unwrap() {
                    return Ok(Self::failed("no chapters"));
                }
                let redirect = args
                    .iter()
                    .position(|a| a == "--redirect-output")
                    .and_then(|i| args.get(i + 1))
                    .unwrap();
                let path = Path::new(redirect);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(path, b"<?xml version=\"1.0\"?>\n<Chapters/>\n").unwrap();
                Ok(Self::ok(""))
            }
            _ => Ok(Self::ok("General\nFormat      : Matroska\n")),
        }
    }
}
