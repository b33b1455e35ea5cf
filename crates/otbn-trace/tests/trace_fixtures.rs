//! Runs every trace pair under `tests/fixtures/` through the checker.
//!
//! Each fixture directory holds `rtl.trace`, `iss.trace` and `expected`.
//! Entries are separated by blank lines. `expected` is a list of
//! `key = value` lines: `matched`, `mismatched`, `skip_wipe_data_check`, and
//! `error` (a substring of the error the checker must report).

use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use otbn_trace::{CheckError, CheckSummary, CheckerConfig, TraceChecker};

fn main() {
    let args = Arguments::from_args();

    let trials = fixture_dirs()
        .into_iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Trial::test(format!("fixture_{name}"), move || run_fixture(&dir))
        })
        .collect();

    libtest_mimic::run(&args, trials).exit();
}

fn fixture_dirs() -> Vec<PathBuf> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut dirs: Vec<PathBuf> = fs::read_dir(&root)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect()
        })
        .unwrap_or_default();
    dirs.sort();
    dirs
}

#[derive(Debug, Default)]
struct Expected {
    skip_wipe_data_check: bool,
    matched: Option<usize>,
    mismatched: Option<usize>,
    error: Option<String>,
}

impl Expected {
    fn load(path: &Path) -> Result<Self, Failed> {
        let text = read(path)?;
        let mut expected = Self::default();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Failed::from(format!("bad expectation line: {line}")))?;
            let value = value.trim();
            let number = || {
                value
                    .parse::<usize>()
                    .map_err(|e| Failed::from(format!("{key}: {e}")))
            };
            match key.trim() {
                "skip_wipe_data_check" => expected.skip_wipe_data_check = value == "true",
                "matched" => expected.matched = Some(number()?),
                "mismatched" => expected.mismatched = Some(number()?),
                "error" => expected.error = Some(value.to_string()),
                other => return Err(Failed::from(format!("unknown expectation: {other}"))),
            }
        }
        Ok(expected)
    }
}

fn read(path: &Path) -> Result<String, Failed> {
    fs::read_to_string(path).map_err(|e| Failed::from(format!("{}: {e}", path.display())))
}

/// Split a trace file into blank-line separated entries.
fn entries(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Feed both traces alternately, one entry each, as a simulation would.
fn check(rtl: &str, iss: &str, config: CheckerConfig) -> Result<CheckSummary, CheckError> {
    let rtl_entries = entries(rtl);
    let iss_entries = entries(iss);
    let mut checker = TraceChecker::new(config);

    let steps = rtl_entries.len().max(iss_entries.len());
    for i in 0..steps {
        if let Some(lines) = rtl_entries.get(i) {
            checker.push_rtl(&lines.join("\n"))?;
        }
        if let Some(lines) = iss_entries.get(i) {
            checker.push_iss(lines)?;
        }
    }
    checker.finish()
}

fn run_fixture(dir: &Path) -> Result<(), Failed> {
    let expected = Expected::load(&dir.join("expected"))?;
    let rtl = read(&dir.join("rtl.trace"))?;
    let iss = read(&dir.join("iss.trace"))?;

    let config = CheckerConfig::default().with_skip_wipe_data_check(expected.skip_wipe_data_check);
    match (check(&rtl, &iss, config), &expected.error) {
        (Ok(summary), None) => {
            let counts = [
                ("matched", expected.matched, summary.matched),
                ("mismatched", expected.mismatched, summary.mismatched),
            ];
            for (what, want, got) in counts {
                match want {
                    Some(want) if want != got => {
                        return Err(format!("{what}: expected {want}, got {got}").into());
                    }
                    _ => {}
                }
            }
            Ok(())
        }
        (Ok(summary), Some(error)) => Err(format!(
            "expected error containing `{error}`, checker finished with {summary:?}"
        )
        .into()),
        (Err(err), Some(error)) if err.to_string().contains(error.as_str()) => Ok(()),
        (Err(err), _) => Err(format!("checker error: {err}").into()),
    }
}
