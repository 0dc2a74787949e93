use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use keeper_kpi::{
    cache::KpiCache,
    config::KpiConfig,
    context::{AnalysisPhase, infer_context},
    engine::{KpiEngine, KpiKind, KpiReport, KpiSet},
    frame::{Column, Context, FrameTable},
    selection::FrameRange,
};
use serde::Serialize;

use crate::{
    persona::Persona,
    util::{self, Output},
};

const DEFAULT_STEP: usize = 5;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AnalyzeArg {
    /// Frame table JSON file
    input: PathBuf,
    /// Phase to analyse (post-match or training); both when omitted
    #[arg(long)]
    pub(super) phase: Option<AnalysisPhase>,
    /// Restrict the report to the KPIs of a persona (headcoach, goalkeepercoach)
    #[arg(long)]
    pub(super) persona: Option<Persona>,
    /// First frame to analyse
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// End of the frame window (exclusive)
    #[arg(long)]
    end: Option<usize>,
    /// Take every n-th frame of the window
    #[arg(long, default_value_t = DEFAULT_STEP)]
    pub(super) step: usize,
    /// Engine configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Heatmap bins along x
    #[arg(long)]
    bins_x: Option<usize>,
    /// Heatmap bins along y
    #[arg(long)]
    bins_y: Option<usize>,
    /// Seed for density sub-sampling
    #[arg(long)]
    seed: Option<u64>,
    /// Sample count above which positions are sub-sampled
    #[arg(long)]
    max_samples: Option<usize>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Run the displacement KPI on every frame of the phase.
    ///
    /// By default frames missing #x0 or #y0 are left out of the displacement
    /// KPI only, so a single gap does not fail it. With this flag such a gap
    /// is reported as an error instead.
    #[arg(long)]
    keep_incomplete: bool,
}

impl AnalyzeArg {
    fn load_config(&self) -> anyhow::Result<KpiConfig> {
        let mut config = util::read_config_file(self.config.as_deref())?;
        if let Some(bins_x) = self.bins_x {
            config.heatmap.bins_x = bins_x;
        }
        if let Some(bins_y) = self.bins_y {
            config.heatmap.bins_y = bins_y;
        }
        if let Some(seed) = self.seed {
            config.density.seed = Some(seed);
        }
        if let Some(max_samples) = self.max_samples {
            config.density.max_samples = max_samples;
        }
        Ok(config)
    }

    fn phases(&self) -> Vec<AnalysisPhase> {
        match self.phase {
            Some(phase) => vec![phase],
            None => vec![AnalysisPhase::PostMatch, AnalysisPhase::Training],
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalysisOutput<'a> {
    generated_at: DateTime<Utc>,
    input: String,
    frame_range: FrameRange,
    persona: Option<Persona>,
    kpis: KpiSet,
    config: &'a KpiConfig,
    frames: FrameCounts,
    phases: Vec<PhaseOutput>,
}

#[derive(Debug, Serialize)]
struct FrameCounts {
    total: usize,
    selected: usize,
    training: usize,
    #[serde(rename = "match")]
    match_: usize,
}

#[derive(Debug, Serialize)]
struct PhaseOutput {
    phase: AnalysisPhase,
    context: Context,
    /// Frames left out of the displacement KPI for missing positions.
    dropped_position_frames: usize,
    report: KpiReport,
}

/// Runs the requested KPIs on one phase slice.
///
/// Unless `keep_incomplete` is set, the displacement KPI sees only the frames
/// with both goalkeeper coordinates. Returns the report and the number of
/// frames it skipped.
fn compute_phase(
    engine: &KpiEngine,
    cache: &KpiCache,
    frames: &FrameTable,
    kpis: KpiSet,
    keep_incomplete: bool,
) -> (KpiReport, usize) {
    if keep_incomplete || !kpis.contains(KpiKind::Displacement) {
        return ((*cache.get_or_compute(engine, frames, kpis)).clone(), 0);
    }
    let positions = frames.complete_rows(&[Column::X0, Column::Y0]);
    let dropped = frames.len() - positions.len();
    if dropped == 0 {
        return ((*cache.get_or_compute(engine, frames, kpis)).clone(), 0);
    }
    log::info!("leaving {dropped} frames without positions out of the displacement KPI");

    let others = kpis
        .iter()
        .filter(|kind| *kind != KpiKind::Displacement)
        .collect::<KpiSet>();
    let mut report = (*cache.get_or_compute(engine, frames, others)).clone();
    let displacement = cache.get_or_compute(
        engine,
        &positions,
        KpiSet::empty().with(KpiKind::Displacement),
    );
    report.displacement.clone_from(&displacement.displacement);
    (report, dropped)
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;
    let engine = KpiEngine::new(config).context("Invalid engine configuration")?;
    let kpis = arg.persona.map_or_else(KpiSet::all, Persona::kpis);

    let table = util::read_frame_table(&arg.input)?;
    let frame_range = FrameRange::new(arg.start, arg.end, arg.step);
    let selected = table
        .select_range(&frame_range)
        .context("Invalid frame range")?;
    let labeled = infer_context(&selected);
    log::info!(
        "selected {} of {} frames ({} match, {} training)",
        selected.len(),
        table.len(),
        labeled.count(Context::Match),
        labeled.count(Context::Training),
    );

    let cache = KpiCache::new();
    let phases = arg
        .phases()
        .into_iter()
        .map(|phase| {
            let context = phase.data_context();
            let frames = labeled.select(context);
            if frames.is_empty() {
                log::warn!("no {context} frames for the {phase} phase");
            }
            let (report, dropped_position_frames) =
                compute_phase(&engine, &cache, &frames, kpis, arg.keep_incomplete);
            PhaseOutput {
                phase,
                context,
                dropped_position_frames,
                report,
            }
        })
        .collect::<Vec<_>>();
    log::debug!(
        "report cache: {} hits, {} misses",
        cache.hits(),
        cache.misses()
    );

    let output = AnalysisOutput {
        generated_at: Utc::now(),
        input: arg.input.display().to_string(),
        frame_range,
        persona: arg.persona,
        kpis,
        config: engine.config(),
        frames: FrameCounts {
            total: table.len(),
            selected: selected.len(),
            training: labeled.count(Context::Training),
            match_: labeled.count(Context::Match),
        },
        phases,
    };
    Output::save_json(&output, arg.output.clone())
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    #[derive(Debug, clap::Parser)]
    struct Wrapper {
        #[clap(flatten)]
        arg: AnalyzeArg,
    }

    fn parse(args: &[&str]) -> AnalyzeArg {
        Wrapper::try_parse_from(std::iter::once("analyze").chain(args.iter().copied()))
            .unwrap()
            .arg
    }

    #[test]
    fn test_flags_override_defaults() {
        let arg = parse(&["in.json", "--bins-x", "4", "--seed", "9"]);
        let config = arg.load_config().unwrap();
        assert_eq!(config.heatmap.bins_x, 4);
        assert_eq!(config.heatmap.bins_y, 10);
        assert_eq!(config.density.seed, Some(9));
        assert_eq!(config.density.max_samples, 3000);
    }

    #[test]
    fn test_phases() {
        assert_eq!(
            parse(&["in.json"]).phases(),
            vec![AnalysisPhase::PostMatch, AnalysisPhase::Training]
        );
        assert_eq!(
            parse(&["in.json", "--phase", "training"]).phases(),
            vec![AnalysisPhase::Training]
        );
    }

    #[test]
    fn test_persona_flag() {
        let arg = parse(&["in.json", "--persona", "headcoach"]);
        assert_eq!(arg.persona, Some(Persona::HeadCoach));
    }

    fn gappy_frames() -> FrameTable {
        FrameTable::default()
            .with_numeric(Column::X0, vec![Some(0.1), Some(0.4), Some(0.4)])
            .unwrap()
            .with_numeric(Column::Y0, vec![Some(0.0), None, Some(0.4)])
            .unwrap()
    }

    #[test]
    fn test_displacement_skips_frames_without_positions() {
        assert!(!parse(&["in.json"]).keep_incomplete);
        let engine = KpiEngine::new(KpiConfig::default()).unwrap();
        let cache = KpiCache::new();
        let (report, dropped) =
            compute_phase(&engine, &cache, &gappy_frames(), KpiSet::all(), false);

        assert_eq!(dropped, 1);
        assert_eq!(report.row_count, 3);
        let pi2 = report.displacement.unwrap().unwrap().computed().unwrap();
        assert_eq!(pi2.step_distances.len(), 1);
        assert!((pi2.total_distance - 0.5).abs() < 1e-12);
        assert!(report.positional.is_some());
        assert!(report.channels.is_some());
    }

    #[test]
    fn test_keep_incomplete_reports_the_gap() {
        assert!(parse(&["in.json", "--keep-incomplete"]).keep_incomplete);
        let engine = KpiEngine::new(KpiConfig::default()).unwrap();
        let (report, dropped) = compute_phase(
            &engine,
            &KpiCache::new(),
            &gappy_frames(),
            KpiSet::all(),
            true,
        );
        assert_eq!(dropped, 0);
        assert!(report.get_error(KpiKind::Displacement).is_some());
    }
}
