//! Fit analysis commands.
//!
//! `analyze` loads a pose sequence, runs [`FitAnalyzer`] and renders the
//! report as tables or JSON. `profiles` prints the ideal-range table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use velofit_core::pipeline::{AnalysisProgress, AnalysisStage};
use velofit_core::{
    AnalysisConfig, BikeGeometry, BodySide, Component, CyclingAngles, FitAnalyzer, FitCategory, FitReport, FitScoreRecord,
    NeverCancel, ProfileTable, Recommendation, RiderMeasurements, Severity,
};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Pose sequence JSON exported by the pose detector
    #[arg(short, long)]
    pub poses: PathBuf,

    /// Riding style (road, time-trial/tt, mountain/mtb, gravel, commute)
    #[arg(short, long)]
    pub style: Option<String>,

    /// Range profile table replacing the built-in one
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Analysis configuration JSON
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rider measurements JSON (supplies the default style)
    #[arg(short, long)]
    pub rider: Option<PathBuf>,

    /// Current bike geometry JSON (enables target saddle height)
    #[arg(short, long)]
    pub bike: Option<PathBuf>,

    /// Body side facing the camera
    #[arg(long, value_enum)]
    pub side: Option<SideArg>,

    /// Minimum usable frames
    #[arg(long)]
    pub min_frames: Option<usize>,

    /// Moving-average window in frames
    #[arg(long)]
    pub smoothing_window: Option<usize>,

    /// Joint confidence threshold (0.0-1.0, exclusive)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the profiles command
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Only show this style
    #[arg(short, long)]
    pub style: Option<String>,

    /// Range profile table replacing the built-in one
    #[arg(long)]
    pub profiles: Option<PathBuf>,
}

/// Body side argument enum for CLI
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for BodySide {
    fn from(val: SideArg) -> Self {
        match val {
            SideArg::Left => BodySide::Left,
            SideArg::Right => BodySide::Right,
        }
    }
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    /// Colored tables
    #[default]
    Table,
    /// JSON document
    Json,
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Ideal")]
    ideal: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Adjustment")]
    adjustment: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(rec: &Recommendation) -> Self {
        Self {
            severity: format_severity(rec.severity),
            component: rec.component.to_string(),
            current: rec.current_value.clone(),
            ideal: rec.ideal_range.clone(),
            score: format!("{:.0}", rec.score),
            adjustment: rec.adjustment.clone(),
        }
    }
}

#[derive(Tabled)]
struct AngleRow {
    #[tabled(rename = "Angle")]
    angle: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Frames")]
    samples: usize,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Style")]
    style: String,
    #[tabled(rename = "Angle")]
    angle: String,
    #[tabled(rename = "Ideal")]
    ideal: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    style: &'a str,
    total_frames: usize,
    usable_frames: usize,
    fit_score: FitScoreRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_saddle_height_cm: Option<f64>,
    angles: &'a CyclingAngles,
    recommendations: &'a [Recommendation],
}

fn format_severity(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Optimal => label.green().to_string(),
        Severity::Minor => label.yellow().to_string(),
        Severity::Moderate => label.bright_red().to_string(),
        Severity::Critical => label.red().bold().to_string(),
    }
}

fn format_category(category: FitCategory) -> String {
    let label = category.as_str().to_uppercase();
    match category {
        FitCategory::Excellent => label.green().bold().to_string(),
        FitCategory::Good => label.bright_green().to_string(),
        FitCategory::Fair => label.yellow().to_string(),
        FitCategory::Poor => label.red().bold().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn load_profiles(path: Option<&Path>) -> Result<ProfileTable> {
    match path {
        Some(p) => ProfileTable::from_json_file(p)
            .with_context(|| format!("loading range profiles from {}", p.display())),
        None => ProfileTable::builtin().context("loading built-in range profiles"),
    }
}

fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(p) => AnalysisConfig::from_json(p)
            .with_context(|| format!("loading analysis config from {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(side) = args.side {
        config.body_side = side.into();
    }
    if let Some(n) = args.min_frames {
        config.min_usable_frames = n;
    }
    if let Some(w) = args.smoothing_window {
        config.smoothing_window = w;
    }
    if let Some(c) = args.confidence {
        config.confidence_threshold = c;
    }
    config.validate().context("invalid analysis settings")?;
    Ok(config)
}

fn load_bike(path: &Path) -> Result<BikeGeometry> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading bike geometry from {}", path.display()))?;
    let bike: BikeGeometry = serde_json::from_str(&contents)
        .with_context(|| format!("parsing bike geometry from {}", path.display()))?;
    bike.validate()?;
    Ok(bike)
}

fn target_saddle_height(report: &FitReport, bike: Option<&BikeGeometry>) -> Option<f64> {
    let bike = bike?;
    report
        .recommendations
        .iter()
        .find(|r| r.component == Component::SaddleHeight)
        .and_then(|r| bike.target_saddle_height_cm(r))
}

fn load_rider(path: &Path) -> Result<RiderMeasurements> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading rider measurements from {}", path.display()))?;
    let rider: RiderMeasurements = serde_json::from_str(&contents)
        .with_context(|| format!("parsing rider measurements from {}", path.display()))?;
    rider.validate()?;
    Ok(rider)
}

/// Execute the analyze command
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = build_config(&args)?;
    let profiles = load_profiles(args.profiles.as_deref())?;
    let rider = args.rider.as_deref().map(load_rider).transpose()?;
    let bike = args.bike.as_deref().map(load_bike).transpose()?;

    let contents = std::fs::read_to_string(&args.poses)
        .with_context(|| format!("reading pose sequence from {}", args.poses.display()))?;
    let sequence: velofit_core::JointSequence = serde_json::from_str(&contents)
        .with_context(|| format!("parsing pose sequence from {}", args.poses.display()))?;

    let style = args
        .style
        .clone()
        .or_else(|| rider.as_ref().map(|r| r.riding_style.id().to_string()))
        .unwrap_or_else(|| "road".to_string());
    info!(
        frames = sequence.len(),
        fps = sequence.fps(),
        style = %style,
        "Loaded pose sequence"
    );

    let analyzer = FitAnalyzer::new(config, profiles)?;

    let pb = match args.format {
        OutputFormat::Table => ProgressBar::new(sequence.len() as u64),
        OutputFormat::Json => ProgressBar::hidden(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    let mut on_progress = |p: &AnalysisProgress| {
        pb.set_position(p.frames_evaluated as u64);
        match p.stage {
            AnalysisStage::FrameEvaluation => pb.set_message(format!("{} usable", p.usable_frames)),
            stage => pb.set_message(stage.to_string()),
        }
    };
    let result = analyzer.analyze_with(&sequence, &style, &NeverCancel, &mut on_progress);
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e.user_message());
            return Err(anyhow::Error::new(e).context("fit analysis failed"));
        }
    };

    match args.format {
        OutputFormat::Json => print_json(&report, bike.as_ref())?,
        OutputFormat::Table => print_report(&report, rider.as_ref(), bike.as_ref()),
    }
    Ok(())
}

fn print_json(report: &FitReport, bike: Option<&BikeGeometry>) -> Result<()> {
    let doc = JsonReport {
        style: report.style.id(),
        total_frames: report.total_frames,
        usable_frames: report.usable_frames,
        fit_score: report.score.to_record(),
        target_saddle_height_cm: target_saddle_height(report, bike),
        angles: &report.angles,
        recommendations: &report.recommendations,
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn print_report(
    report: &FitReport,
    rider: Option<&RiderMeasurements>,
    bike: Option<&BikeGeometry>,
) {
    println!("{}", "Bike Fit Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Style:".dimmed(), report.style.display_name());
    println!(
        "  {} {}/{} usable",
        "Frames:".dimmed(),
        report.usable_frames,
        report.total_frames
    );
    if let Some(rider) = rider {
        if let Some(name) = &rider.name {
            println!("  {} {}", "Rider:".dimmed(), name);
        }
        println!(
            "  {} {:.1} cm (LeMond, static)",
            "Saddle height estimate:".dimmed(),
            rider.estimated_saddle_height_cm()
        );
    }
    println!(
        "  {} {:.1} / 100  {}",
        "Overall:".dimmed(),
        report.score.overall(),
        format_category(report.score.category())
    );
    println!();

    let angle_rows: Vec<AngleRow> = report
        .angles
        .present()
        .map(|(kind, stats)| AngleRow {
            angle: kind.label().to_string(),
            min: format!("{:.1}°", stats.min),
            max: format!("{:.1}°", stats.max),
            mean: format!("{:.1}°", stats.mean),
            samples: stats.samples,
        })
        .collect();
    println!("{}", "Measured Angles".bold());
    println!("{}", Table::new(angle_rows).with(Style::rounded()));
    if let Some(flexion) = report.angles.knee_flexion_max() {
        println!("  {} {:.1}°", "Max knee flexion:".dimmed(), flexion);
    }
    println!();

    let target = target_saddle_height(report, bike);
    let rows: Vec<RecommendationRow> = report
        .recommendations
        .iter()
        .map(|rec| {
            let mut row = RecommendationRow::from(rec);
            if let (Component::SaddleHeight, Some(current), Some(target)) = (
                rec.component,
                bike.and_then(BikeGeometry::saddle_height),
                target,
            ) {
                row.adjustment = format!("{} ({current:.1} -> {target:.1} cm)", row.adjustment);
            }
            row
        })
        .collect();
    println!("{}", "Recommendations".bold());
    println!("{}", Table::new(rows).with(Style::rounded()));

    let needs_work = report
        .recommendations
        .iter()
        .filter(|r| r.severity.needs_adjustment())
        .count();
    if needs_work == 0 {
        println!("{} All measured areas are within their ideal ranges.", "[OK]".green().bold());
    } else {
        println!(
            "{} {} area(s) need adjustment. Change one thing at a time and re-test.",
            "[INFO]".blue(),
            needs_work
        );
    }
}

/// Execute the profiles command
pub fn execute_profiles(args: ProfilesArgs) -> Result<()> {
    let table = load_profiles(args.profiles.as_deref())?;
    let selected = match &args.style {
        Some(id) => vec![table.for_style(id)?],
        None => table.profiles().collect(),
    };

    let rows: Vec<ProfileRow> = selected
        .into_iter()
        .flat_map(|profile| {
            profile.ranges().map(move |(kind, range)| ProfileRow {
                style: profile.style().id().to_string(),
                angle: kind.label().to_string(),
                ideal: format!("{}–{}°", range.min(), range.max()),
                weight: format!("{}", range.weight()),
            })
        })
        .collect();

    println!("{}", "Ideal Ranges".bold().cyan());
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(poses: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            poses,
            style: None,
            profiles: None,
            config: None,
            rider: None,
            bike: None,
            side: None,
            min_frames: None,
            smoothing_window: None,
            confidence: None,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let mut a = args(PathBuf::from("unused.json"));
        a.side = Some(SideArg::Right);
        a.min_frames = Some(10);
        a.smoothing_window = Some(3);
        let cfg = build_config(&a).unwrap();
        assert_eq!(cfg.body_side, BodySide::Right);
        assert_eq!(cfg.min_usable_frames, 10);
        assert_eq!(cfg.smoothing_window, 3);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut a = args(PathBuf::from("unused.json"));
        a.confidence = Some(1.5);
        assert!(build_config(&a).is_err());
    }

    #[test]
    fn test_missing_pose_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute_analyze(args(dir.path().join("missing.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("reading pose sequence"));
    }

    #[test]
    fn test_rider_file_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"height_cm": 300.0}"#).unwrap();
        assert!(load_rider(file.path()).is_err());
    }

    #[test]
    fn test_bike_file_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"stem_angle_deg": 35.0}"#).unwrap();
        let err = load_bike(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("stem_angle_deg"));

        let mut ok = tempfile::NamedTempFile::new().unwrap();
        ok.write_all(br#"{"saddle_height_cm": 73.0}"#).unwrap();
        assert_eq!(load_bike(ok.path()).unwrap().saddle_height(), Some(73.0));
    }

    #[test]
    fn test_empty_sequence_fails_analysis() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"fps": 30.0, "frames": []}"#).unwrap();
        let err = execute_analyze(args(file.path().to_path_buf())).unwrap_err();
        assert!(format!("{err:#}").contains("Insufficient data"));
    }
}
