use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use dataguard_core::config::Config;
use dataguard_core::github::{fetch_file, language_for_path};
use dataguard_core::llm::PerplexityLlm;
use dataguard_core::notify::SlackNotifier;
use dataguard_core::report::{Failure, Success};
use dataguard_core::roast::{RoastLevel, RoastReport, RoastRequest, Roaster};
use dataguard_core::types::{CodeIssue, GradeColor, IncidentAnalysis, ScoreResult, Severity};
use dataguard_core::{score, Analyzer, ClassifyRequest};

const GITHUB_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(
    name = "dataguard",
    version,
    about = "Incident triage and code roast scoring"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a free-text incident report.
    Classify {
        #[arg(long, conflicts_with = "request")]
        message: Option<String>,

        /// JSON body `{"message": ...}`; `-` reads stdin.
        #[arg(long)]
        request: Option<PathBuf>,

        /// Skip the AI service even when a key is configured.
        #[arg(long)]
        no_ai: bool,

        /// Post the drafted alert to the chat webhook.
        #[arg(long)]
        notify: bool,

        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score a JSON array of code issues.
    Score {
        /// `-` reads stdin.
        #[arg(long)]
        issues: PathBuf,
    },
    /// Ask the AI critic to roast a snippet and score the findings.
    Roast {
        /// JSON body `{"code", "language", "roastLevel"}`; `-` reads stdin.
        #[arg(long, conflicts_with_all = ["file", "github"])]
        request: Option<PathBuf>,

        #[arg(long, conflicts_with = "github")]
        file: Option<PathBuf>,

        /// GitHub blob URL of the file to roast.
        #[arg(long)]
        github: Option<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long, default_value = "medium")]
        level: Level,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Level {
    Gentle,
    Medium,
    Savage,
}

impl From<Level> for RoastLevel {
    fn from(l: Level) -> Self {
        match l {
            Level::Gentle => RoastLevel::Gentle,
            Level::Medium => RoastLevel::Medium,
            Level::Savage => RoastLevel::Savage,
        }
    }
}

/// Bad caller input, as opposed to a failure while handling it.
#[derive(Debug)]
struct InvalidInput(String);

impl std::fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidInput {}

fn invalid(msg: impl Into<String>) -> anyhow::Error {
    InvalidInput(msg.into()).into()
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    blue: &'static str,
    orange: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    blue: "\x1b[34m",
    orange: "\x1b[38;5;208m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    blue: "",
    orange: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref());

    let res = match cli.cmd {
        Commands::Classify {
            message,
            request,
            no_ai,
            notify,
            out,
        } => run_classify(&cfg, message, request.as_deref(), no_ai, notify, out.as_deref()),
        Commands::Score { issues } => run_score(&issues),
        Commands::Roast {
            request,
            file,
            github,
            language,
            level,
            out,
        } => resolve_roast_request(request.as_deref(), file.as_deref(), github, language, level)
            .and_then(|req| run_roast(&cfg, &req, out.as_deref())),
    };

    match res {
        Ok(()) => std::process::ExitCode::from(0),
        Err(e) => {
            let s = style();
            print_json(&Failure::new(format!("{e:#}")));
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            if e.downcast_ref::<InvalidInput>().is_some() {
                std::process::ExitCode::from(2)
            } else {
                std::process::ExitCode::from(1)
            }
        }
    }
}

fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}data{reset}{orange}|{reset}{dim}guard{reset}  {dim}incident triage{reset}\n",
        bold = s.bold,
        orange = s.orange,
        dim = s.dim,
        reset = s.reset,
    );
}

fn severity_color(sev: &Severity) -> &'static str {
    let s = style();
    match sev {
        Severity::Critical => s.red,
        Severity::High => s.orange,
        Severity::Medium => s.yellow,
        Severity::Low => s.dim,
    }
}

fn grade_color(c: &GradeColor) -> &'static str {
    let s = style();
    match c {
        GradeColor::Green => s.green,
        GradeColor::Blue => s.blue,
        GradeColor::Yellow => s.yellow,
        GradeColor::Orange => s.orange,
        GradeColor::Red => s.red,
    }
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| {
            eprintln!(
                "{}{}warning:{} failed to load config {}: {:#}",
                style().bold,
                style().yellow,
                style().reset,
                p.display(),
                e
            );
            Config::default()
        }),
        None => Config::discover().unwrap_or_default(),
    }
}

/// Reads a file, or stdin when the path is `-`.
fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("read stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("read {}", path.display()))
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize response"),
    }
}

fn write_outputs(out: &Path, json: &impl Serialize, md: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("create out dir {}", out.display()))?;

    let json_path = out.join("report.json");
    let md_path = out.join("report.md");

    let bytes = serde_json::to_vec_pretty(json).context("serialize report json")?;
    std::fs::write(&json_path, bytes).with_context(|| format!("write {}", json_path.display()))?;
    std::fs::write(&md_path, md).with_context(|| format!("write {}", md_path.display()))?;
    Ok(())
}

fn run_classify(
    cfg: &Config,
    message: Option<String>,
    request: Option<&Path>,
    no_ai: bool,
    notify: bool,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let message = match (message, request) {
        (Some(m), _) if !m.trim().is_empty() => m,
        (Some(_), _) => return Err(invalid("message is required")),
        (None, Some(p)) => {
            let bytes = read_input(p)?;
            ClassifyRequest::from_json(&bytes)
                .map_err(|e| invalid(format!("{e:#}")))?
                .message
        }
        (None, None) => return Err(invalid("one of --message or --request is required")),
    };

    print_banner();

    let analyzer = if no_ai {
        Analyzer::rules_only()
    } else {
        Analyzer::from_config(cfg)
    };
    let analysis = analyzer.analyze(&message);

    if let Some(out) = out {
        write_outputs(out, &analysis, &analysis.to_markdown())?;
    }

    print_json(&Success::new(&analysis));
    print_analysis(&analysis);

    if notify {
        if let Some((text, channel)) = analysis.slack_draft() {
            post_draft(cfg, text, channel);
        }
    }

    eprintln!();
    Ok(())
}

/// Chat delivery never changes the outcome of a handled request.
fn post_draft(cfg: &Config, text: &str, channel: Option<&str>) {
    let s = style();
    match SlackNotifier::from_config(cfg).post(text, channel) {
        Ok(delivery) => eprintln!(
            "  {dim}posted to{reset} {bold}{}{reset}{dim}{}{reset}",
            delivery.channel,
            if delivery.simulated { " (simulated)" } else { "" },
            dim = s.dim,
            bold = s.bold,
            reset = s.reset
        ),
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(%error, "failed to post drafted alert");
            eprintln!(
                "  {yellow}notify failed:{reset} {error}",
                yellow = s.yellow,
                reset = s.reset
            );
        }
    }
}

fn print_analysis(a: &IncidentAnalysis) {
    let s = style();
    let sc = severity_color(&a.severity);

    eprintln!(
        "  {dim}type      {reset}{bold}{}{reset}",
        a.kind,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}service   {reset}{bold}{}{reset}",
        a.service.as_deref().unwrap_or("-"),
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}severity  {reset}{sc}{bold}{}{reset}",
        a.severity,
        dim = s.dim,
        sc = sc,
        bold = s.bold,
        reset = s.reset
    );

    if !a.suggested_actions.is_empty() {
        let actions: Vec<&str> = a.suggested_actions.iter().map(|x| x.as_str()).collect();
        eprintln!(
            "  {dim}actions   {reset}{}",
            actions.join(", "),
            dim = s.dim,
            reset = s.reset
        );
    }
}

fn print_score(r: &ScoreResult) {
    let s = style();
    let gc = grade_color(&r.grade_color);
    eprintln!(
        "  {dim}grade            {reset}{gc}{bold}{}{reset}  {dim}({}){reset}",
        r.grade,
        r.overall,
        dim = s.dim,
        gc = gc,
        bold = s.bold,
        reset = s.reset
    );
    for (label, v) in [
        ("security        ", r.security),
        ("performance     ", r.performance),
        ("maintainability ", r.maintainability),
    ] {
        eprintln!(
            "  {dim}{label} {reset}{bold}{v}{reset}",
            dim = s.dim,
            bold = s.bold,
            reset = s.reset
        );
    }
}

fn run_score(path: &Path) -> anyhow::Result<()> {
    let bytes = read_input(path)?;
    let issues: Vec<CodeIssue> = serde_json::from_slice(&bytes)
        .map_err(|e| invalid(format!("parse issues json: {e}")))?;

    let result = score(&issues);
    print_json(&Success::new(&result));
    print_score(&result);
    Ok(())
}

fn resolve_roast_request(
    request: Option<&Path>,
    file: Option<&Path>,
    github: Option<String>,
    language: Option<String>,
    level: Level,
) -> anyhow::Result<RoastRequest> {
    if let Some(p) = request {
        let bytes = read_input(p)?;
        return serde_json::from_slice(&bytes)
            .map_err(|e| invalid(format!("parse roast request json: {e}")));
    }

    let (code, detected) = match (file, github) {
        (Some(p), _) => {
            let code = std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
            (code, language_for_path(&p.display().to_string()).to_string())
        }
        (None, Some(url)) => {
            let f = fetch_file(&url, GITHUB_TIMEOUT)?;
            (f.code, f.language)
        }
        (None, None) => return Err(invalid("one of --request, --file or --github is required")),
    };

    Ok(RoastRequest {
        code,
        language: language.unwrap_or(detected),
        roast_level: level.into(),
    })
}

fn run_roast(cfg: &Config, req: &RoastRequest, out: Option<&Path>) -> anyhow::Result<()> {
    if req.code.trim().is_empty() {
        return Err(invalid("Code is required"));
    }
    let key = cfg
        .api_key()
        .context("Misconfigured: Missing Perplexity API Key")?;

    print_banner();

    let roaster = Roaster::new(PerplexityLlm::new(key, &cfg.ai));
    let report: RoastReport = roaster.roast(req)?;

    if let Some(out) = out {
        write_outputs(out, &report, &report.to_markdown())?;
    }

    print_json(&Success::new(&report));
    print_score(&report.score);
    let s = style();
    for i in &report.issues {
        eprintln!(
            "  {dim}{:?}/{:?}{reset}  {}",
            i.severity,
            i.issue_type,
            i.title,
            dim = s.dim,
            reset = s.reset
        );
    }

    eprintln!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn severity_color_thresholds() {
        assert_eq!(severity_color(&Severity::Critical), style().red);
        assert_eq!(severity_color(&Severity::Medium), style().yellow);
        assert_eq!(severity_color(&Severity::Low), style().dim);
    }

    #[test]
    fn grade_color_mapping() {
        assert_eq!(grade_color(&GradeColor::Green), style().green);
        assert_eq!(grade_color(&GradeColor::Red), style().red);
    }

    #[test]
    #[serial]
    fn style_respects_no_color() {
        std::env::set_var("NO_COLOR", "1");
        assert_eq!(style().bold, "");
        std::env::remove_var("NO_COLOR");
        assert_ne!(style().bold, "");
    }

    #[test]
    fn invalid_input_is_detectable_through_context() {
        let e = invalid("message is required").context("classify");
        assert!(e.downcast_ref::<InvalidInput>().is_some());
    }

    #[test]
    fn roast_request_from_file_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("handler.py");
        std::fs::write(&p, "eval(input())").unwrap();

        let req = resolve_roast_request(None, Some(&p), None, None, Level::Savage).unwrap();
        assert_eq!(req.language, "python");
        assert_eq!(req.roast_level, RoastLevel::Savage);
        assert_eq!(req.code, "eval(input())");
    }

    #[test]
    fn roast_request_language_flag_overrides_detection() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("snippet.txt");
        std::fs::write(&p, "SELECT *").unwrap();

        let req =
            resolve_roast_request(None, Some(&p), None, Some("sql".to_string()), Level::Medium)
                .unwrap();
        assert_eq!(req.language, "sql");
    }
}
