//! Stream Effects - command line driver
//!
//! Runs the effects pipeline over a still image, repeating it as a short
//! stream so animated effects and telemetry have something to show.

use std::path::PathBuf;

use clap::Parser;

use stream_effects::config::DeviceProfile;
use stream_effects::effects::topology::{Tessellation, TESSELLATION_FILE};
use stream_effects::imaging::{apply_color_filter, ColorFilter};
use stream_effects::ml::onnx::OnnxLoader;
use stream_effects::ml::replay::ReplayLoader;
use stream_effects::ml::{FallbackLoader, InferenceEngine, ModelLoader};
use stream_effects::telemetry::{init_logging, LogConfig};
use stream_effects::{
    AvatarType, ConfigManager, ControlHandle, EffectSelection, EffectsPipeline, Frame, Mode,
    TimeBase,
};

#[derive(Parser)]
#[command(name = "stream-effects")]
#[command(about = "Apply AI video effects to an image")]
struct Args {
    /// Input image
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Effect mode (none, blur, face-detection, pose-estimation, edge-detection,
    /// face-mesh, avatar, hands, beauty, cartoon)
    #[arg(short, long, default_value = "none")]
    mode: String,

    /// Avatar style (cartoon, robot, mask, neon)
    #[arg(short, long, default_value = "cartoon")]
    avatar: String,

    /// Quality preset (performance, balanced, quality)
    #[arg(short, long)]
    preset: Option<String>,

    /// Device profile (mobile, tablet, desktop, high_end)
    #[arg(short, long)]
    device: Option<String>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding ONNX models
    #[arg(long)]
    models: Option<PathBuf>,

    /// Directory of recorded predictions, one `<model>.json` per model
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Number of times to run the image through the pipeline
    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    /// Color filter applied to the result (warm, cool, vintage, vivid)
    #[arg(long)]
    filter: Option<String>,

    /// Face-mesh tessellation edge table (JSON array of index pairs);
    /// defaults to `face_mesh_tessellation.json` in the models directory
    #[arg(long)]
    tessellation: Option<PathBuf>,

    /// Seed for the cartoon color clustering
    #[arg(long)]
    seed: Option<u64>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let _log_guard = init_logging(&LogConfig {
        file_enabled: args.log_file.is_some(),
        file_path: args.log_file.clone(),
        ..LogConfig::default()
    })?;

    tracing::info!("Starting stream-effects");

    let mut config = match (&args.config, &args.device) {
        (Some(path), _) => ConfigManager::load(path)?,
        (None, Some(device)) => ConfigManager::for_device(device.parse::<DeviceProfile>()?),
        (None, None) => ConfigManager::new(),
    };
    config.apply_process_env()?;
    if let Some(preset) = &args.preset {
        config.set_quality_preset_str(preset)?;
    }

    // No GPU execution provider is compiled in
    for warning in config.validate(false) {
        tracing::warn!("{}", warning);
    }

    let filter = args
        .filter
        .as_deref()
        .map(str::parse::<ColorFilter>)
        .transpose()?;

    let model_dir = args.models.clone().or_else(OnnxLoader::find_model_dir);
    let tessellation_path = args.tessellation.clone().or_else(|| {
        model_dir
            .as_ref()
            .map(|dir| dir.join(TESSELLATION_FILE))
            .filter(|path| path.is_file())
    });
    let tessellation = match &tessellation_path {
        Some(path) => Tessellation::load(path)?,
        None => Tessellation::empty(),
    };

    let mut loaders: Vec<Box<dyn ModelLoader>> = Vec::new();
    if let Some(dir) = model_dir {
        loaders.push(Box::new(
            OnnxLoader::new(dir).with_intra_threads(config.processing.thread_count),
        ));
    }
    if let Some(dir) = &args.replay {
        loaders.push(Box::new(ReplayLoader::new(dir)));
    }
    let engine = InferenceEngine::load(&FallbackLoader::new(loaders), &mut config);

    let control = ControlHandle::new(EffectSelection {
        mode: Mode::from_id(&args.mode),
        avatar_type: AvatarType::from_id(&args.avatar),
    });
    if control.snapshot().mode == Mode::FaceMesh && tessellation.is_empty() {
        tracing::warn!("No tessellation table loaded; face mesh draws contours only");
    }
    let mut pipeline = EffectsPipeline::new(config, engine, control);
    pipeline.set_tessellation(tessellation);
    if let Some(seed) = args.seed {
        pipeline.set_cartoon_seed(seed);
    }

    let image = image::open(&args.input)?.to_rgb8();
    tracing::info!(
        input = %args.input.display(),
        width = image.width(),
        height = image.height(),
        "Loaded input image"
    );

    let time_base = TimeBase::VIDEO_90K;
    let frame_step = i64::from(time_base.den) / i64::from(pipeline.config().processing.target_fps.max(1));
    let mut output = None;
    for i in 0..args.frames.max(1) {
        let frame = Frame::from_rgb_image(image.clone())
            .with_timing(Some(i64::from(i) * frame_step), time_base);
        output = Some(pipeline.process(frame));
    }

    let Some(output) = output else {
        return Ok(());
    };
    let mut result = output.to_rgb_image()?;
    if let Some(filter) = filter {
        result = apply_color_filter(&result, filter);
    }
    result.save(&args.output)?;

    let stats = pipeline.stats();
    tracing::info!(
        output = %args.output.display(),
        frames = stats.frame_count(),
        errors = stats.errors(),
        "{}",
        stats.fps_text()
    );

    Ok(())
}
