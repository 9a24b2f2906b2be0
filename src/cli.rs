use crate::report::ExportFormat;
use clap::Parser;

const HELP_TEMPLATE: &str = "\
{before-help}{about-with-newline}

{usage-heading}
  {usage}

{tab}Options:
{options}

{after-help}
";

#[derive(Parser, Debug)]
#[command(name = "audit-ng", version)]
#[command(about = "Audits a cloud account against a set of security checks")]
#[command(
    long_about = "audit-ng collects the account metadata every registered check needs\n\
    in a single pass, then evaluates all checks against that snapshot and\n\
    reports an OK/WARN/FAIL/UNKNOWN status per check, resource and region.\n\n\
    Credentials come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY /\n\
    AWS_SESSION_TOKEN / AWS_DEFAULT_REGION or from credentials.json next to\n\
    the configuration file ($AUDIT_NG_CONFIG)."
)]
#[command(
    help_template = HELP_TEMPLATE,
    after_help = "Examples:\n\
    \n\
    Run a scan:\n\
      $ audit-ng\n\
    \n\
    Run a scan and write results.csv:\n\
      $ audit-ng --export csv"
)]
pub struct Cli {
    /// Export format for the results
    ///
    /// Only `csv` (case-insensitive) is supported; any other value
    /// leaves export disabled.
    #[arg(long = "export", value_name = "FORMAT")]
    pub export: Option<String>,
}

impl Cli {
    pub fn export_format(&self) -> Option<ExportFormat> {
        ExportFormat::parse(self.export.as_deref())
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Generate shell completion scripts
pub fn generate_completions(shell: &str, app: &mut clap::Command) {
    use clap_complete::{generate, shells};
    match shell {
        "zsh" => {
            generate(shells::Zsh, app, "audit-ng", &mut std::io::stdout());
        }
        "fish" => {
            generate(shells::Fish, app, "audit-ng", &mut std::io::stdout());
        }
        "bash" => {
            generate(shells::Bash, app, "audit-ng", &mut std::io::stdout());
        }
        "powershell" => {
            generate(shells::PowerShell, app, "audit-ng", &mut std::io::stdout());
        }
        _ => {
            eprintln!("Unsupported shell: {}", shell);
            eprintln!("Supported shells: zsh, fish, bash, powershell");
        }
    }
}
