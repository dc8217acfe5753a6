//! Check Command: evaluate a fragment's snapshot against a saved state

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tftest::{load_test_step, State, TestOptions};

use crate::output::{print_info, print_success};

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration fragment whose snapshot is checked
    pub fragment: PathBuf,

    /// Output of `terraform show -json`
    #[arg(short, long)]
    pub state: PathBuf,
}

/// Returns `Ok(false)` when the fragment has nothing to assert.
pub fn check(fragment: &Path, state_file: &Path, options: &TestOptions) -> Result<bool> {
    let steps = load_test_step(fragment, options)?;
    let data = std::fs::read(state_file)
        .with_context(|| format!("failed to read state {}", state_file.display()))?;
    let state = State::from_show_json(&data)?;

    let Some(check) = steps.first().and_then(|step| step.check.as_ref()) else {
        return Ok(false);
    };
    check.run(&state)?;
    Ok(true)
}

pub fn execute(args: CheckArgs, options: TestOptions) -> Result<()> {
    // Offline checks always compare; refreshing needs a real apply.
    let options = options.with_refresh(false);
    if check(&args.fragment, &args.state, &options)? {
        print_success(&format!("{} matches its snapshot", args.fragment.display()));
    } else {
        print_info(&format!("{} has no snapshot assertions", args.fragment.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHOW: &str = r#"{"values": {"root_module": {"resources": [
        {"address": "dummy_resource.test", "type": "dummy_resource",
         "values": {"id": "1", "name": "first"}}
    ]}}}"#;

    #[test]
    fn test_check_against_show_json() {
        let dir = TempDir::new().unwrap();
        let fragment = dir.path().join("main.tf");
        fs::write(&fragment, "# Check: dummy_resource.test\n").unwrap();
        fs::write(
            dir.path().join("main.json"),
            r#"{"dummy_resource.test": {"id": "<set>", "name": "first"}}"#,
        )
        .unwrap();
        let state = dir.path().join("state.json");
        fs::write(&state, SHOW).unwrap();

        assert!(check(&fragment, &state, &TestOptions::assert_mode()).unwrap());

        fs::write(
            dir.path().join("main.json"),
            r#"{"dummy_resource.test": {"name": "second"}}"#,
        )
        .unwrap();
        assert!(check(&fragment, &state, &TestOptions::assert_mode()).is_err());
    }

    #[test]
    fn test_check_without_snapshot() {
        let dir = TempDir::new().unwrap();
        let fragment = dir.path().join("main.tf");
        fs::write(&fragment, "# Check: dummy_resource.test\n").unwrap();
        let state = dir.path().join("state.json");
        fs::write(&state, SHOW).unwrap();
        assert!(!check(&fragment, &state, &TestOptions::assert_mode()).unwrap());
    }
}
