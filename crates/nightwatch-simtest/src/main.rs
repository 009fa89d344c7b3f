//! Nightwatch Headless Night Harness
//!
//! Plays whole nights with scripted players and checks the outcomes.
//! Runs entirely in-process: no window, no audio device. Sounds come from
//! the in-memory loader and are ended after their clip length, the way the
//! audio thread would.
//!
//! Usage:
//!   cargo run -p nightwatch-simtest
//!   cargo run -p nightwatch-simtest -- --nights 50 --policy watchful --verbose
//!   RUST_LOG=nightwatch_logic=debug cargo run -p nightwatch-simtest -- --nights 1

mod cli;
mod policy;

use std::collections::{BTreeMap, HashMap};
use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nightwatch_logic::assets::{AssetManifest, MemoryAssets};
use nightwatch_logic::clock::seconds_to_ticks;
use nightwatch_logic::night::{Night, NightEvent, NightOutcome, TickReport};
use nightwatch_logic::registry::AgentRegistry;
use nightwatch_logic::script::NightScript;
use nightwatch_logic::store::JsonFileStore;
use serde::Deserialize;

use cli::{Args, Policy};

// ── Bundled first night (same files the integration tests use) ─────────
const NIGHT1_JSON: &str = include_str!("../../../data/night1.json");
const NIGHT1_ASSETS_JSON: &str = include_str!("../../../data/night1_assets.json");

const DEFAULT_CLIP_SECONDS: f32 = 2.0;
/// A night that outlives its duration by this much is stuck.
const MAX_JUMPSCARE_SECONDS: f32 = 60.0;

/// Clip lengths ride along in the asset manifest under `clip_seconds`.
#[derive(Debug, Default, Deserialize)]
struct ClipLengths {
    #[serde(default)]
    clip_seconds: HashMap<String, f32>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NightRun {
    seed: u64,
    outcome: NightOutcome,
    ticks: u64,
    killer: Option<String>,
}

struct Harness {
    script: NightScript,
    manifest: AssetManifest,
    lengths: ClipLengths,
    registry: AgentRegistry,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    println!("=== Nightwatch Night Harness ===\n");

    let (script_text, assets_text) = load_sources(&args)?;
    let harness = Harness {
        script: NightScript::from_json(&script_text).context("parsing night script")?,
        manifest: serde_json::from_str(&assets_text).context("parsing asset manifest")?,
        lengths: serde_json::from_str(&assets_text).context("parsing clip lengths")?,
        registry: AgentRegistry::builtin(),
    };
    let mut store = args
        .store
        .as_ref()
        .map(JsonFileStore::open)
        .transpose()
        .context("opening progress store")?;

    let mut results = Vec::new();

    // 1. Script builds against its assets
    let assets = MemoryAssets::from_manifest(&harness.manifest);
    let built = harness.build(&assets, args.seed);
    results.push(TestResult {
        name: "script_builds".into(),
        passed: built.is_ok(),
        detail: match &built {
            Ok(night) => format!(
                "`{}`: {} cameras, {} agents, {} ticks",
                night.config().name,
                night.cameras().len(),
                night.agents().len(),
                night.config().duration_ticks
            ),
            Err(err) => format!("{err:#}"),
        },
    });
    if built.is_err() {
        return finish(results, args.verbose);
    }
    drop(built);

    // 2. Every policy over the seed range
    let policies = match args.policy {
        Some(policy) => vec![policy],
        None => Policy::ALL.to_vec(),
    };
    for policy in policies {
        results.extend(run_policy(&harness, policy, &args, store.as_mut())?);
    }

    finish(results, args.verbose)
}

fn load_sources(args: &Args) -> Result<(String, String)> {
    let script = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading night script {}", path.display()))?,
        None => NIGHT1_JSON.to_string(),
    };
    let assets = match &args.assets {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading asset manifest {}", path.display()))?,
        None => NIGHT1_ASSETS_JSON.to_string(),
    };
    Ok((script, assets))
}

fn finish(results: Vec<TestResult>, verbose: bool) -> Result<()> {
    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Policy sweep ────────────────────────────────────────────────────────

fn run_policy(
    harness: &Harness,
    policy: Policy,
    args: &Args,
    mut store: Option<&mut JsonFileStore>,
) -> Result<Vec<TestResult>> {
    println!("--- {} ---", policy.name());
    let mut results = Vec::new();
    let mut runs = Vec::new();
    let mut stuck = Vec::new();

    for i in 0..args.nights {
        let seed = args.seed + i as u64;
        match harness.play(policy, seed) {
            Ok(run) => {
                if args.verbose {
                    println!(
                        "  seed {:>4}: {:?} after {} ticks{}",
                        run.seed,
                        run.outcome,
                        run.ticks,
                        run.killer
                            .as_deref()
                            .map(|k| format!(" ({k})"))
                            .unwrap_or_default()
                    );
                }
                if let Some(store) = store.as_deref_mut() {
                    let key = format!("{}.{}", harness.script.name, policy.name());
                    run.outcome
                        .record(store, &key)
                        .with_context(|| format!("recording {key}"))?;
                }
                runs.push(run);
            }
            Err(err) => stuck.push(format!("seed {seed}: {err:#}")),
        }
    }

    let completed = runs
        .iter()
        .filter(|r| r.outcome == NightOutcome::Completed)
        .count();
    let mut kills: BTreeMap<&str, usize> = BTreeMap::new();
    for killer in runs.iter().filter_map(|r| r.killer.as_deref()) {
        *kills.entry(killer).or_default() += 1;
    }
    let fps = harness.script.fps.max(1) as f64;
    let mean_seconds = if runs.is_empty() {
        0.0
    } else {
        runs.iter().map(|r| r.ticks as f64 / fps).sum::<f64>() / runs.len() as f64
    };
    println!(
        "  survived {}/{}  mean night {:.1}s  kills {:?}",
        completed,
        runs.len(),
        mean_seconds,
        kills
    );

    // Every night reaches an outcome
    results.push(TestResult {
        name: format!("{}_nights_terminate", policy.name()),
        passed: stuck.is_empty(),
        detail: if stuck.is_empty() {
            format!("{} nights ended", runs.len())
        } else {
            stuck.join("; ")
        },
    });

    // Shut doors cannot be passed
    if policy == Policy::DoorsClosed {
        let failed: Vec<_> = runs
            .iter()
            .filter(|r| r.outcome == NightOutcome::Failed)
            .map(|r| r.seed.to_string())
            .collect();
        results.push(TestResult {
            name: "doors_closed_never_fails".into(),
            passed: failed.is_empty(),
            detail: if failed.is_empty() {
                format!("{completed} nights survived")
            } else {
                format!("failed on seeds {}", failed.join(", "))
            },
        });
    }

    // Same seed, same night
    if let Some(first) = runs.first() {
        let replay = harness.play(policy, first.seed);
        let same = replay.as_ref().map(|r| r == first).unwrap_or(false);
        results.push(TestResult {
            name: format!("{}_replay_deterministic", policy.name()),
            passed: same,
            detail: match replay {
                Ok(r) if same => format!("seed {} replayed in {} ticks", r.seed, r.ticks),
                Ok(r) => format!("seed {}: {:?} vs {:?}", r.seed, first, r),
                Err(err) => format!("{err:#}"),
            },
        });
    }

    Ok(results)
}

impl Harness {
    fn build(&self, assets: &MemoryAssets, seed: u64) -> Result<Night> {
        let mut script = self.script.clone();
        script.seed = Some(seed);
        script
            .build(assets, &self.registry)
            .with_context(|| format!("building night `{}` with seed {seed}", script.name))
    }

    /// Play one night to its outcome.
    fn play(&self, policy: Policy, seed: u64) -> Result<NightRun> {
        let assets = MemoryAssets::from_manifest(&self.manifest);
        let mut night = self.build(&assets, seed)?;

        let fps = night.config().fps;
        let mut clock = AudioClock::new(&assets, &self.manifest, &self.lengths, fps);
        let mut player = policy::player(policy, &night);
        let limit =
            night.config().duration_ticks + seconds_to_ticks(MAX_JUMPSCARE_SECONDS, fps);

        let mut last: Option<TickReport> = None;
        let mut killer = None;
        while night.tick_count() < limit {
            let input = player.input(&mut night, last.as_ref());
            let report = night.tick(input)?;
            clock.tick(report.tick);
            for event in &report.events {
                if let NightEvent::JumpscareStarted { agent } = event {
                    killer = Some(agent.clone());
                }
            }
            if let Some(outcome) = report.outcome {
                return Ok(NightRun {
                    seed,
                    outcome,
                    ticks: report.tick + 1,
                    killer,
                });
            }
            last = Some(report);
        }

        bail!(
            "night `{}` still running after {} ticks",
            night.config().name,
            night.tick_count()
        )
    }
}

// ── Simulated audio device ──────────────────────────────────────────────

struct Clip {
    path: String,
    length_ticks: u64,
    seen_plays: usize,
    started: u64,
}

/// Ends each recorded sound once it has played for its clip length.
struct AudioClock<'a> {
    assets: &'a MemoryAssets,
    clips: Vec<Clip>,
}

impl<'a> AudioClock<'a> {
    fn new(
        assets: &'a MemoryAssets,
        manifest: &AssetManifest,
        lengths: &ClipLengths,
        fps: u32,
    ) -> Self {
        let clips = manifest
            .sounds
            .iter()
            .map(|path| {
                let seconds = lengths
                    .clip_seconds
                    .get(path)
                    .copied()
                    .unwrap_or(DEFAULT_CLIP_SECONDS);
                Clip {
                    path: path.clone(),
                    length_ticks: seconds_to_ticks(seconds, fps).max(1),
                    seen_plays: 0,
                    started: 0,
                }
            })
            .collect();
        Self { assets, clips }
    }

    fn tick(&mut self, tick: u64) {
        for clip in &mut self.clips {
            let Some(sound) = self.assets.sound(&clip.path) else {
                continue;
            };
            let plays = sound.play_count();
            if plays > clip.seen_plays {
                clip.seen_plays = plays;
                clip.started = tick;
            }
            if sound.is_playing() && tick.saturating_sub(clip.started) >= clip.length_ticks {
                sound.finish();
            }
        }
    }
}
