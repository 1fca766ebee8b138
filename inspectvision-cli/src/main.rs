use clap::Parser;
use inspectvision::image::io::{load_frame, save_frame, DirectorySource};
use inspectvision::value::BinaryConfig;
use inspectvision::{
    Capabilities, Category, CycleOutput, CycleSink, FrameSource, InspectError, InspectResult,
    Monitor, MonitorConfig, ObjectSpec, ReferenceValue, Region, SimilarityWeights, SourceRegistry,
    TrackConfig, TrackedObject, TsvLogger, Value,
};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "InspectVision replay CLI (JSON config driven)",
    long_about = "InspectVision replay CLI (JSON config driven).\n\n\
        Only binary (lamp) objects are supported here. Numeric and plot objects \
        need a glyph detector, which an embedding application supplies through \
        `Capabilities`."
)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

/// Categories the CLI can bind. Numeric and plot objects need a glyph
/// detector, which the CLI does not ship.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CategoryConfig {
    Binary,
}

impl From<CategoryConfig> for Category {
    fn from(value: CategoryConfig) -> Self {
        match value {
            CategoryConfig::Binary => Category::Binary,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ReferenceValueConfig {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<ReferenceValueConfig> for ReferenceValue {
    fn from(value: ReferenceValueConfig) -> Self {
        match value {
            ReferenceValueConfig::Flag(on) => ReferenceValue::Flag(on),
            ReferenceValueConfig::Number(n) => ReferenceValue::Number(n),
            ReferenceValueConfig::Text(text) => ReferenceValue::Text(text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectConfig {
    name: String,
    category: CategoryConfig,
    region: [usize; 4],
    #[serde(default)]
    reference_value: Option<ReferenceValueConfig>,
}

impl ObjectConfig {
    fn into_spec(self) -> ObjectSpec {
        let [x, y, width, height] = self.region;
        let region = Region::new(x, y, width, height);
        let mut spec = ObjectSpec::new(self.name, self.category.into(), region);
        spec.reference_value = self.reference_value.map(Into::into);
        spec
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackConfigJson {
    cross_correlation_weight: f32,
    structural_weight: f32,
    min_similarity: f32,
    pixel_step: usize,
    epsilon: f32,
    max_margin: f32,
}

impl Default for TrackConfigJson {
    fn default() -> Self {
        let cfg = TrackConfig::default();
        Self {
            cross_correlation_weight: cfg.weights.cross_correlation,
            structural_weight: cfg.weights.structural,
            min_similarity: cfg.min_similarity,
            pixel_step: cfg.pixel_step,
            epsilon: cfg.epsilon,
            max_margin: cfg.binary.max_margin,
        }
    }
}

impl From<&TrackConfigJson> for TrackConfig {
    fn from(value: &TrackConfigJson) -> Self {
        TrackConfig {
            weights: SimilarityWeights::new(
                value.cross_correlation_weight,
                value.structural_weight,
            ),
            min_similarity: value.min_similarity,
            pixel_step: value.pixel_step,
            epsilon: value.epsilon,
            binary: BinaryConfig {
                max_margin: value.max_margin,
                ..BinaryConfig::default()
            },
            ..TrackConfig::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MonitorConfigJson {
    update_positions: bool,
    max_drift_iterations: usize,
    warmup_frames: usize,
    parallel: bool,
}

impl Default for MonitorConfigJson {
    fn default() -> Self {
        let cfg = MonitorConfig::default();
        Self {
            update_positions: cfg.update_positions,
            max_drift_iterations: cfg.max_drift_iterations,
            warmup_frames: cfg.warmup_frames,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    frames_dir: String,
    base_frame: Option<String>,
    objects: Vec<ObjectConfig>,
    track: TrackConfigJson,
    monitor: MonitorConfigJson,
    log_dir: Option<String>,
    log_every_secs: f64,
    annotated_dir: Option<String>,
    max_cycles: Option<u64>,
}

/// Prints one JSON line per cycle.
struct JsonLines;

impl CycleSink for JsonLines {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        let values: serde_json::Map<String, serde_json::Value> = output
            .values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Binary(on) => json!(on),
                    Value::Numeric(text) => json!(text),
                };
                (name.to_string(), value)
            })
            .collect();
        let objects: Vec<serde_json::Value> = output
            .objects
            .iter()
            .map(|o| {
                json!({
                    "name": o.name,
                    "x": o.region.x(),
                    "y": o.region.y(),
                    "similarity": o.similarity,
                })
            })
            .collect();
        let line = json!({
            "index": output.index,
            "time": output.captured_at.to_rfc3339(),
            "values": values,
            "objects": objects,
        });
        println!("{line}");
        Ok(())
    }
}

/// Saves every annotated frame as `cycle_NNNNNN.png`.
struct AnnotatedFrames {
    dir: PathBuf,
}

impl CycleSink for AnnotatedFrames {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        let path = self.dir.join(format!("cycle_{:06}.png", output.index));
        save_frame(output.annotated.view(), path)
    }
}

/// Minimum gap between log rows; rejects negative, non-finite and
/// unrepresentable values.
fn log_interval(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs)
        .map_err(|err| format!("log_every_secs must be a non-negative number of seconds: {err}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("inspectvision=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames_dir.is_empty() {
        return Err("frames_dir must be set in the config".into());
    }
    if config.objects.is_empty() {
        return Err("objects must list at least one object".into());
    }
    let log_every = log_interval(config.log_every_secs)?;

    let source = DirectorySource::open(&config.frames_dir)?;
    let available = source.remaining() as u64;
    let base = match &config.base_frame {
        Some(path) => load_frame(path)?,
        None => DirectorySource::open(&config.frames_dir)?.capture()?,
    };

    let capabilities = Capabilities::default();
    let track = TrackConfig::from(&config.track);
    let objects = config
        .objects
        .into_iter()
        .map(|object| TrackedObject::new(object.into_spec(), base.view(), track, &capabilities))
        .collect::<InspectResult<Vec<_>>>()?;

    let monitor_cfg = MonitorConfig {
        update_positions: config.monitor.update_positions,
        max_drift_iterations: config.monitor.max_drift_iterations,
        warmup_frames: config.monitor.warmup_frames,
        parallel: config.monitor.parallel,
        ..MonitorConfig::default()
    };
    let registry = SourceRegistry::new();
    let session = registry.open(source)?;
    let mut monitor = Monitor::new(session, objects, monitor_cfg)?;

    let replayable = available.saturating_sub(monitor_cfg.warmup_frames as u64);
    let cycles = config
        .max_cycles
        .map_or(replayable, |max| max.min(replayable));

    let mut json_lines = JsonLines;
    let mut logger = match &config.log_dir {
        Some(dir) => Some(TsvLogger::new(
            dir,
            monitor.names(),
            log_every,
        )?),
        None => None,
    };
    let mut annotated = match &config.annotated_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(AnnotatedFrames {
                dir: PathBuf::from(dir),
            })
        }
        None => None,
    };

    let mut sinks: Vec<&mut dyn CycleSink> = vec![&mut json_lines];
    if let Some(logger) = logger.as_mut() {
        sinks.push(logger);
    }
    if let Some(annotated) = annotated.as_mut() {
        sinks.push(annotated);
    }

    match monitor.run(&mut sinks, Some(cycles)) {
        Ok(done) => {
            tracing::info!(cycles = done, "replay finished");
            if monitor.sink_errors() > 0 {
                eprintln!("{} sink write(s) failed", monitor.sink_errors());
            }
            Ok(())
        }
        Err(err @ InspectError::Drift { .. }) => {
            eprintln!("tracking lost: {err}");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
