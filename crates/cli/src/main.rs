// modelcheck CLI - headless validation of route-planning workbook submissions

mod config;
mod exit_codes;
mod logger;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{info, warn};
use modelcheck_io::report::{export_filled_aux, export_report};
use modelcheck_io::{load_input, memo, CalamineReader};
use modelcheck_validator::document::EDITABLE_FIELDS;
use modelcheck_validator::summary::{counts_line, verdict_label};
use modelcheck_validator::{
    InputRole, MemoFields, RunSession, ValidationReport, ValidatorConfig, ValidatorError,
};

use exit_codes::{
    validation_exit_code, validator_exit_code, EXIT_ERROR, EXIT_GENERATION_BLOCKED, EXIT_IO,
    EXIT_SUCCESS, EXIT_USAGE,
};

/// Output file names written by `generate` into `--out-dir`.
pub const REPORT_TEXT: &str = "validation_report.txt";
pub const REPORT_XLSX: &str = "validation_report.xlsx";
pub const REPORT_JSON: &str = "validation_report.json";
pub const FILLED_AUX: &str = "aux_filled.xlsx";

#[derive(Parser)]
#[command(name = "modelcheck")]
#[command(about = "Validate route-planning workbook submissions and generate the review report")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    /// MODELCHECK_LOG=<off|error|warn|info|debug|trace> overrides -v and -q
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only errors on stderr; no checklist table
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Rule-set config file (TOML)
    #[arg(long, global = true, env = "MODELCHECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct InputArgs {
    /// Core route-model workbook (.xlsx)
    model: Option<PathBuf>,

    /// Request memo (PDF); used for field suggestions
    #[arg(long)]
    memo: Option<PathBuf>,

    /// Reference ranges workbook (minimum/maximum beneficiaries per axis code)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Historical baseline workbook (prior period routes and budgets)
    #[arg(long)]
    historical: Option<PathBuf>,

    /// Auxiliary tables workbook, filled on generate
    #[arg(long)]
    aux: Option<PathBuf>,
}

impl InputArgs {
    fn supplied(&self) -> Vec<(InputRole, &Path)> {
        [
            (InputRole::Memo, &self.memo),
            (InputRole::Model, &self.model),
            (InputRole::Reference, &self.reference),
            (InputRole::Historical, &self.historical),
            (InputRole::Aux, &self.aux),
        ]
        .into_iter()
        .filter_map(|(role, path)| path.as_deref().map(|p| (role, p)))
        .collect()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checklist and print it
    #[command(after_help = "\
Examples:
  modelcheck validate modelo.xlsx
  modelcheck validate modelo.xlsx --reference daei.xlsx --historical 2025.xlsx
  modelcheck validate modelo.xlsx --json > report.json
  modelcheck validate modelo.xlsx --strict --csv checklist.csv

Exit codes:
  0  OK, or WARN without --strict
  3  at least one FAIL
  4  WARN with --strict")]
    Validate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Also write the checklist as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Treat WARN as a failing exit code
        #[arg(long)]
        strict: bool,
    },

    /// Validate, then write the report document and workbooks
    #[command(after_help = "\
Examples:
  modelcheck generate modelo.xlsx --memo memo.pdf --out-dir salida
  modelcheck generate modelo.xlsx --field para='Director Distrital' --field firma='Ing. Ana Pérez'
  modelcheck generate modelo.xlsx --aux auxiliares.xlsx --template plantilla.txt

Editable fields: memo_nro, memo_fecha, para, de, asunto, anio_lectivo, firma")]
    Generate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Memo field as key=value (repeatable); overrides memo suggestions
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Plain-text template with {{slot}} placeholders
        #[arg(long, value_name = "PATH")]
        template: Option<PathBuf>,

        /// Directory for the generated files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Generation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Also write the JSON report into the output directory
        #[arg(long)]
        json: bool,
    },

    /// Show the fields guessed from a memo PDF
    Memo {
        /// Memo document (PDF)
        pdf: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective rule-set config
    Config {
        /// Print the built-in defaults instead of the effective config
        #[arg(long)]
        print_default: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nvalidator: modelcheck-validator ", env!("CARGO_PKG_VERSION"),
        "\ntarget:    ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: modelcheck <command> [options]");
            eprintln!("       modelcheck --help for more information");
            Ok(EXIT_SUCCESS)
        }
        Some(Commands::Validate {
            inputs,
            json,
            csv,
            strict,
        }) => cmd_validate(&ctx, &inputs, json, csv.as_deref(), strict),
        Some(Commands::Generate {
            inputs,
            fields,
            template,
            out_dir,
            date,
            json,
        }) => cmd_generate(
            &ctx,
            &inputs,
            &fields,
            template.as_deref(),
            &out_dir,
            date.as_deref(),
            json,
        ),
        Some(Commands::Memo { pdf, json }) => cmd_memo(&pdf, json),
        Some(Commands::Config { print_default }) => cmd_config(&ctx, print_default),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ValidatorError> for CliError {
    fn from(err: ValidatorError) -> Self {
        let code = validator_exit_code(&err);
        let hint = match &err {
            ValidatorError::GenerationBlocked { .. } => {
                Some("fix the FAIL checks above and run again".to_string())
            }
            ValidatorError::Template(_) => Some(format!(
                "editable fields: {}",
                EDITABLE_FIELDS.join(", ")
            )),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

// ============================================================================
// Shared plumbing
// ============================================================================

struct Context {
    quiet: bool,
    config: Option<PathBuf>,
}

impl Context {
    fn load_config(&self) -> Result<ValidatorConfig, CliError> {
        let (config, source) = config::load(self.config.as_deref())?;
        info!("config: {}", source.describe());
        Ok(config)
    }
}

/// Load every supplied input into a fresh session. The memo is also run
/// through text extraction; its guesses come back for field prefill.
fn prepare_session(
    config: ValidatorConfig,
    inputs: &InputArgs,
) -> Result<(RunSession, MemoFields), CliError> {
    let mut session = RunSession::new(config);
    let mut suggestions = MemoFields::default();

    for (role, path) in inputs.supplied() {
        let file = load_input(path).map_err(|e| CliError::io(format!("cannot read {role}: {e}")))?;
        info!(
            "{role}: {} ({} bytes, {})",
            file.name,
            file.bytes.len(),
            file.fingerprint.as_deref().unwrap_or("-")
        );
        session.load(role, file);

        if role == InputRole::Memo {
            let (text, fields) = memo::suggest(path);
            session.set_memo_text(text);
            suggestions = fields;
        }
    }

    Ok((session, suggestions))
}

fn print_summary(report: &ValidationReport) {
    eprint!("{}", util::checklist_table(&report.checks));
    for note in &report.notes {
        eprintln!("  note: {}", note);
    }
    if report.halted() {
        eprintln!("run halted after stage: {}", report.stage);
    }
    eprintln!(
        "{}  {}  ({})",
        report.overall,
        verdict_label(report.overall),
        counts_line(&report.counts)
    );
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate, CliError> {
    match value {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            CliError::args(format!("invalid --date '{}'", s)).with_hint("use YYYY-MM-DD")
        }),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_validate(
    ctx: &Context,
    inputs: &InputArgs,
    json: bool,
    csv: Option<&Path>,
    strict: bool,
) -> Result<u8, CliError> {
    let config = ctx.load_config()?;
    let (mut session, _) = prepare_session(config, inputs)?;
    let report = session.validate(Some(&CalamineReader));

    if !ctx.quiet {
        print_summary(report);
    }
    if let Some(path) = csv {
        modelcheck_io::csv::export(&report.checks, path).map_err(CliError::io)?;
    }
    if json {
        let out = modelcheck_io::json::to_string(report).map_err(CliError::general)?;
        println!("{}", out);
    }

    Ok(validation_exit_code(report.overall, strict))
}

fn cmd_generate(
    ctx: &Context,
    inputs: &InputArgs,
    field_args: &[String],
    template: Option<&Path>,
    out_dir: &Path,
    date: Option<&str>,
    json: bool,
) -> Result<u8, CliError> {
    let date = parse_date(date)?;
    let mut fields = MemoFields::default();
    for assignment in field_args {
        fields.assign(assignment)?;
    }
    let template = template
        .map(|p| {
            std::fs::read_to_string(p)
                .map_err(|e| CliError::io(format!("cannot read template {}: {}", p.display(), e)))
        })
        .transpose()?;

    let config = ctx.load_config()?;
    let sheet_names = config.sheets.clone();
    let (mut session, suggestions) = prepare_session(config, inputs)?;
    fields.fill_missing(&suggestions);

    let report = session.validate(Some(&CalamineReader));
    if !ctx.quiet {
        print_summary(report);
    }
    if !session.can_generate() {
        return Err(CliError {
            code: EXIT_GENERATION_BLOCKED,
            message: "generation blocked: the checklist has FAIL results".to_string(),
            hint: Some("fix the FAIL checks above and run again".to_string()),
        });
    }

    let doc = session.generate(&fields, template.as_deref(), date)?;
    let report = session
        .last_report()
        .ok_or_else(|| CliError::general("validation result missing after generation"))?;

    std::fs::create_dir_all(out_dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {}", out_dir.display(), e)))?;
    let mut written = Vec::new();

    let text_path = out_dir.join(REPORT_TEXT);
    std::fs::write(&text_path, &doc.text)
        .map_err(|e| CliError::io(format!("{}: {}", text_path.display(), e)))?;
    written.push(text_path);

    let xlsx_path = out_dir.join(REPORT_XLSX);
    export_report(&report.checks, &doc.slots, &xlsx_path).map_err(CliError::io)?;
    written.push(xlsx_path);

    if let Some(aux) = session.request().input(InputRole::Aux) {
        match modelcheck_io::xlsx::decode(&aux.bytes) {
            Ok(workbook) => {
                let aux_path = out_dir.join(FILLED_AUX);
                let result =
                    export_filled_aux(&workbook, &report.checks, &doc.slots, &sheet_names, &aux_path)
                        .map_err(CliError::io)?;
                info!(
                    "filled auxiliary workbook: {} sheets, checklist on {:?}",
                    result.sheets_exported, result.checklist_sheet
                );
                written.push(aux_path);
            }
            Err(e) => warn!("auxiliary workbook '{}' not filled: {}", aux.name, e),
        }
    }

    if json {
        let json_path = out_dir.join(REPORT_JSON);
        modelcheck_io::json::export(report, &json_path).map_err(CliError::io)?;
        written.push(json_path);
    }

    if !doc.unknown_placeholders.is_empty() {
        eprintln!(
            "warning: template placeholders left as-is: {}",
            doc.unknown_placeholders.join(", ")
        );
    }
    if !ctx.quiet {
        eprintln!("verdict: {}", doc.verdict);
        for path in &written {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(EXIT_SUCCESS)
}

fn cmd_memo(pdf: &Path, json: bool) -> Result<u8, CliError> {
    if !pdf.is_file() {
        return Err(CliError::io(format!("{}: no such file", pdf.display())));
    }
    let (text, fields) = memo::suggest(pdf);
    if text.is_none() {
        eprintln!("warning: no text extracted; suggestions are empty");
    }

    if json {
        let out = serde_json::to_string_pretty(&fields)
            .map_err(|e| CliError::general(format!("JSON serialization failed: {}", e)))?;
        println!("{}", out);
    } else {
        for key in EDITABLE_FIELDS {
            println!("{}: {}", key, fields.get(key).unwrap_or(""));
        }
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_config(ctx: &Context, print_default: bool) -> Result<u8, CliError> {
    let (config, source) = if print_default {
        (ValidatorConfig::default(), config::ConfigSource::Defaults)
    } else {
        config::load(ctx.config.as_deref())?
    };
    let text = config.to_toml()?;
    println!("# source: {}", source.describe());
    print!("{}", text);
    Ok(EXIT_SUCCESS)
}
