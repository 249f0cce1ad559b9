//! Per-item summary printed after a batch

use fonttik_core::MediaOutcome;

fn verdict(pass: bool) -> &'static str {
    if pass {
        "PASS"
    } else {
        "FAIL"
    }
}

pub fn print_text(outcomes: &[MediaOutcome]) {
    for (i, outcome) in outcomes.iter().enumerate() {
        let position = format!("[{}/{}]", i + 1, outcomes.len());
        match &outcome.error {
            Some(error) => println!("✗ {} {} - ERROR: {}", position, outcome.path.display(), error),
            None => println!(
                "{} {} {} - size {}, contrast {} ({} frames)",
                if outcome.passed() { "✓" } else { "✗" },
                position,
                outcome.path.display(),
                verdict(outcome.size_pass),
                verdict(outcome.contrast_pass),
                outcome.frames_checked
            ),
        }
    }

    let passed = outcomes.iter().filter(|o| o.passed()).count();
    let errors = outcomes.iter().filter(|o| !o.is_processed()).count();
    println!(
        "{} items: {} passed, {} failed checks, {} errors",
        outcomes.len(),
        passed,
        outcomes.len() - passed - errors,
        errors
    );
}

pub fn print_jsonl(outcomes: &[MediaOutcome]) {
    for outcome in outcomes {
        let line = match &outcome.error {
            Some(error) => serde_json::json!({
                "type": "error",
                "file": outcome.path.display().to_string(),
                "error": error,
            }),
            None => serde_json::json!({
                "type": "result",
                "file": outcome.path.display().to_string(),
                "size": verdict(outcome.size_pass),
                "contrast": verdict(outcome.contrast_pass),
                "frames_checked": outcome.frames_checked,
                "outputs": outcome
                    .outputs
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            }),
        };
        println!("{line}");
    }
}
