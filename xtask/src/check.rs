//! Workspace-wide quality checks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use xshell::{Shell, cmd};

/// Crate source roots scanned for `unwrap`/`expect`.
const LIBRARY_SOURCES: &[&str] = &[
    "sensor/head-types/src",
    "sensor/head-fusion/src",
    "display/display-acquire/src",
    "apps/headglass/src",
];

type Step = (&'static str, fn(&Shell) -> Result<()>);

const STEPS: &[Step] = &[
    ("Formatting", run_fmt_check),
    ("Clippy", run_clippy),
    ("Tests", run_tests),
    ("Documentation", run_doc_check),
    ("Safety", run_safety_scan),
];

/// Runs every check. Failures are reported; in CI mode they also fail the process.
pub fn run(ci_mode: bool) -> Result<()> {
    let sh = Shell::new()?;

    println!();
    println!("{}", "headglass quality check".bold());
    println!();

    let mut all_passed = true;
    for (name, step) in STEPS {
        println!("{}", format!("{name}...").dimmed());
        match step(&sh) {
            Ok(()) => println!("  {} {name}", "✓".green()),
            Err(e) => {
                println!("  {} {name} - {e}", "✗".red());
                all_passed = false;
            }
        }
    }

    println!();
    if all_passed {
        println!("{}", "✓ All checks passed".green().bold());
        Ok(())
    } else if ci_mode {
        bail!("some checks failed");
    } else {
        println!("{}", "⚠ Some checks failed. Fix before committing.".yellow());
        Ok(())
    }
}

/// Runs the CI suite and fails on the first summary with any failure.
pub fn run_ci() -> Result<()> {
    let sh = Shell::new()?;

    println!();
    println!("{}", "headglass CI suite".bold());
    println!();

    let total = STEPS.len();
    let mut failures = Vec::new();
    for (i, (name, step)) in STEPS.iter().enumerate() {
        println!("{}", format!("Step {}/{total}: {name}", i + 1).cyan());
        if let Err(e) = step(&sh) {
            println!("  {} {name} failed", "✗".red());
            failures.push(format!("{name}: {e:#}"));
        } else {
            println!("  {} {name} OK", "✓".green());
        }
    }

    println!();
    if failures.is_empty() {
        println!("{}", "  ✓ CI PASSED".green().bold());
        return Ok(());
    }

    println!("{}", "  ✗ CI FAILED".red().bold());
    for f in &failures {
        println!("  - {}", f.red());
    }
    bail!("{} of {total} steps failed", failures.len())
}

fn run_fmt_check(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check")
        .run()
        .context("formatting check failed")
}

fn run_clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings")
        .run()
        .context("clippy reported warnings")
}

fn run_tests(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo test --workspace")
        .run()
        .context("tests failed")
}

fn run_doc_check(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo doc --workspace --no-deps")
        .env("RUSTDOCFLAGS", "-D warnings")
        .run()
        .context("documentation build failed")
}

fn run_safety_scan(sh: &Shell) -> Result<()> {
    let root = sh.current_dir();
    let mut violations = Vec::new();

    for dir in LIBRARY_SOURCES {
        for file in rust_files(&root.join(dir))? {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            for (line_no, line) in unguarded_calls(&text) {
                violations.push(format!("{}:{line_no}: {line}", file.display()));
            }
        }
    }

    if violations.is_empty() {
        return Ok(());
    }
    for v in &violations {
        println!("    {}", v.dimmed());
    }
    bail!("{} unwrap/expect calls outside tests", violations.len())
}

fn rust_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(rust_files(&path)?);
        } else if path.extension().is_some_and(|e| e == "rs") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `unwrap()`/`expect(` calls before the file's test module, skipping comments.
///
/// Only a top-level `#[cfg(test)]` ends the scan; gated items inside an
/// `impl` do not.
fn unguarded_calls(text: &str) -> Vec<(usize, &str)> {
    text.lines()
        .enumerate()
        .take_while(|(_, line)| !line.starts_with("#[cfg(test)]"))
        .filter(|(_, line)| {
            let code = line.trim_start();
            !code.starts_with("//") && (code.contains(".unwrap()") || code.contains(".expect("))
        })
        .map(|(i, line)| (i + 1, line.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_stops_at_test_module() {
        let src = "fn a() { x.unwrap_or(1); }\n\
                   /// y.unwrap()\n\
                   fn b() { y.expect(\"no\"); }\n\
                   #[cfg(test)]\n\
                   mod tests { fn c() { z.unwrap(); } }\n";
        let hits = unguarded_calls(src);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 3);
    }

    #[test]
    fn gated_method_does_not_end_scan() {
        let src = "impl A {\n    #[cfg(test)]\n    fn t(&self) {}\n}\nfn b() { y.unwrap(); }\n";
        let hits = unguarded_calls(src);
        assert_eq!(hits, vec![(5, "fn b() { y.unwrap(); }")]);
    }
}
