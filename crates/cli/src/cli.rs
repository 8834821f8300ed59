use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Validate JSON/YAML payloads against declarative rule documents.
///
/// Flags override the `RULECHECK_*` environment (and `.env`) configuration.
#[derive(Parser, Debug)]
#[command(name = "rulecheck", version, about)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Directory rule references are resolved against.
    #[arg(long, global = true)]
    pub rules_dir: Option<PathBuf>,

    /// Maximum rule nesting (composite and array levels).
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Evaluate sibling rules and array elements in parallel.
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Configuration profile (prefix for every RULECHECK_* key).
    #[arg(long, env = "RULECHECK_PROFILE", global = true)]
    pub profile: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Format-check a rule document and every element config it references.
    Check {
        /// Reference relative to the rules directory, e.g. `validation/employee.json`.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        reference: Option<String>,

        /// Check every document under the rules directory instead.
        #[arg(long)]
        all: bool,
    },

    /// Validate a payload and print the outcome as JSON.
    Validate {
        /// Reference of the rule document to apply.
        reference: String,

        /// Payload file (`.json`, `.yml`, `.yaml`), or `-` for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Treat every input line as a separate JSON payload.
        #[arg(long)]
        lines: bool,

        /// Reload rule documents when they change on disk (with `--lines`).
        #[arg(long)]
        watch: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn check_requires_reference_or_all() {
        assert!(CliArgs::try_parse_from(["rulecheck", "check"]).is_err());
        assert!(CliArgs::try_parse_from(["rulecheck", "check", "--all"]).is_ok());
        assert!(CliArgs::try_parse_from(["rulecheck", "check", "a.json", "--all"]).is_err());
    }

    #[test]
    fn validate_defaults_to_stdin() {
        let args = CliArgs::try_parse_from([
            "rulecheck",
            "validate",
            "validation/employee.json",
            "--max-depth",
            "8",
        ])
        .unwrap();
        assert_eq!(args.global.max_depth, Some(8));
        match args.command {
            Command::Validate { reference, input, lines, .. } => {
                assert_eq!(reference, "validation/employee.json");
                assert_eq!(input, "-");
                assert!(!lines);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
