//! Command-line surface of the challenge binaries
//!
//! Flags mirror the configuration fields. A `--config` file (TOML or RON) is
//! loaded first and every flag given on the command line overrides it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scenegen::camera_path::CameraSchemeName;
use scenegen::config::{AssetSplit, Config, GsoConfig, SceneConfig};

/// Parse a resolution given as `N` (square) or `WxH`
pub fn parse_resolution(value: &str) -> Result<(u32, u32), String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid resolution '{value}': {e}"))
    };
    match value.split_once(['x', 'X']) {
        Some((width, height)) => Ok((parse(width)?, parse(height)?)),
        None => parse(value).map(|n| (n, n)),
    }
}

fn common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Load settings from a .toml or .ron file before applying flags"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64))
                .help("Seed of the scene generator (random when omitted)"),
        )
        .arg(Arg::new("frame_start").long("frame_start").value_parser(value_parser!(i32)))
        .arg(Arg::new("frame_end").long("frame_end").value_parser(value_parser!(i32)))
        .arg(Arg::new("frame_rate").long("frame_rate").value_parser(value_parser!(u32)))
        .arg(
            Arg::new("resolution")
                .long("resolution")
                .value_name("N|WxH")
                .value_parser(parse_resolution),
        )
        .arg(
            Arg::new("job_dir")
                .long("job-dir")
                .alias("job_dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Output directory"),
        )
        .arg(
            Arg::new("gso_assets")
                .long("gso_assets")
                .value_name("MANIFEST")
                .help("Manifest of the scanned objects (path or builtin:<name>)"),
        )
}

/// Command of the multi-capture binary
pub fn multicapture_command() -> Command {
    let splits = ["train", "test"];
    common_args(Command::new("multicapture"))
        .about("Generates a multi-capture scene with train and held-out views")
        .arg(Arg::new("objects_split").long("objects_split").value_parser(splits))
        .arg(
            Arg::new("min_num_static_objects")
                .long("min_num_static_objects")
                .value_parser(value_parser!(usize))
                .help("minimum number of static (distractor) objects"),
        )
        .arg(
            Arg::new("max_num_static_objects")
                .long("max_num_static_objects")
                .value_parser(value_parser!(usize))
                .help("maximum number of static (distractor) objects"),
        )
        .arg(
            Arg::new("min_num_dynamic_objects")
                .long("min_num_dynamic_objects")
                .value_parser(value_parser!(usize))
                .help("minimum number of dynamic (tossed) objects"),
        )
        .arg(
            Arg::new("max_num_dynamic_objects")
                .long("max_num_dynamic_objects")
                .value_parser(value_parser!(usize))
                .help("maximum number of dynamic (tossed) objects"),
        )
        .arg(Arg::new("floor_friction").long("floor_friction").value_parser(value_parser!(f32)))
        .arg(
            Arg::new("floor_restitution")
                .long("floor_restitution")
                .value_parser(value_parser!(f32)),
        )
        .arg(Arg::new("backgrounds_split").long("backgrounds_split").value_parser(splits))
        .arg(
            Arg::new("camera")
                .long("camera")
                .value_parser(CameraSchemeName::NAMES)
                .help("Training camera trajectory"),
        )
        .arg(Arg::new("min_radius").long("min_radius").value_parser(value_parser!(f32)))
        .arg(Arg::new("max_radius").long("max_radius").value_parser(value_parser!(f32)))
        .arg(Arg::new("max_motion_blur").long("max_motion_blur").value_parser(value_parser!(f32)))
        .arg(Arg::new("kubasic_assets").long("kubasic_assets").value_name("MANIFEST"))
        .arg(Arg::new("hdri_assets").long("hdri_assets").value_name("MANIFEST"))
        .arg(
            Arg::new("save_state")
                .long("save_state")
                .action(ArgAction::SetTrue)
                .help("Persist simulator and renderer state next to the output"),
        )
}

/// Command of the novel-view binary
pub fn gso_command() -> Command {
    common_args(Command::new("gso_views"))
        .about("Renders one scanned object from the fixed novel-view cameras")
        .arg(
            Arg::new("pose_archive")
                .long("pose_archive")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Stored camera poses (.json or .ron, 3x4 world-to-camera matrices)"),
        )
        .arg(
            Arg::new("asset_index")
                .long("asset_index")
                .value_parser(value_parser!(usize))
                .help("Index into the sorted asset ids (defaults to the job directory name)"),
        )
}

fn load_or_default<C: Config>(matches: &ArgMatches) -> Result<C> {
    match matches.get_one::<String>("config") {
        Some(path) => C::load_from_file(Path::new(path))
            .with_context(|| format!("Failed to load config '{path}'")),
        None => Ok(C::default()),
    }
}

fn override_with<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str, field: &mut T) {
    if let Some(value) = matches.get_one::<T>(id) {
        *field = value.clone();
    }
}

/// Multi-capture configuration from the parsed command line
pub fn scene_config_from_matches(matches: &ArgMatches) -> Result<SceneConfig> {
    let mut config: SceneConfig = load_or_default(matches)?;

    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    override_with(matches, "frame_start", &mut config.frame_start);
    override_with(matches, "frame_end", &mut config.frame_end);
    override_with(matches, "frame_rate", &mut config.frame_rate);
    override_with(matches, "resolution", &mut config.resolution);
    override_with(matches, "job_dir", &mut config.job_dir);
    override_with(matches, "gso_assets", &mut config.gso_assets);
    override_with(matches, "kubasic_assets", &mut config.kubasic_assets);
    override_with(matches, "hdri_assets", &mut config.hdri_assets);
    override_with(matches, "min_num_static_objects", &mut config.min_num_static_objects);
    override_with(matches, "max_num_static_objects", &mut config.max_num_static_objects);
    override_with(matches, "min_num_dynamic_objects", &mut config.min_num_dynamic_objects);
    override_with(matches, "max_num_dynamic_objects", &mut config.max_num_dynamic_objects);
    override_with(matches, "floor_friction", &mut config.floor_friction);
    override_with(matches, "floor_restitution", &mut config.floor_restitution);
    override_with(matches, "min_radius", &mut config.min_radius);
    override_with(matches, "max_radius", &mut config.max_radius);
    override_with(matches, "max_motion_blur", &mut config.max_motion_blur);

    if let Some(split) = matches.get_one::<String>("objects_split") {
        config.objects_split = split.parse::<AssetSplit>()?;
    }
    if let Some(split) = matches.get_one::<String>("backgrounds_split") {
        config.backgrounds_split = split.parse::<AssetSplit>()?;
    }
    if let Some(camera) = matches.get_one::<String>("camera") {
        config.camera = camera.parse::<CameraSchemeName>()?;
    }
    if matches.get_flag("save_state") {
        config.save_state = true;
    }

    config.validate()?;
    Ok(config)
}

/// Novel-view configuration from the parsed command line
pub fn gso_config_from_matches(matches: &ArgMatches) -> Result<GsoConfig> {
    let mut config: GsoConfig = load_or_default(matches)?;

    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(archive) = matches.get_one::<PathBuf>("pose_archive") {
        config.pose_archive = Some(archive.clone());
    }
    if let Some(index) = matches.get_one::<usize>("asset_index") {
        config.asset_index = Some(*index);
    }
    override_with(matches, "frame_start", &mut config.frame_start);
    override_with(matches, "frame_end", &mut config.frame_end);
    override_with(matches, "frame_rate", &mut config.frame_rate);
    override_with(matches, "resolution", &mut config.resolution);
    override_with(matches, "job_dir", &mut config.job_dir);
    override_with(matches, "gso_assets", &mut config.gso_assets);

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_forms() {
        assert_eq!(parse_resolution("256"), Ok((256, 256)));
        assert_eq!(parse_resolution("640x480"), Ok((640, 480)));
        assert!(parse_resolution("wide").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let matches = multicapture_command()
            .try_get_matches_from([
                "multicapture",
                "--seed",
                "5",
                "--camera",
                "linear_movement",
                "--max_num_static_objects",
                "12",
                "--resolution",
                "128",
                "--save_state",
            ])
            .unwrap();
        let config = scene_config_from_matches(&matches).unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.camera, CameraSchemeName::LinearMovement);
        assert_eq!(config.max_num_static_objects, 12);
        assert_eq!(config.min_num_static_objects, 10);
        assert_eq!(config.resolution, (128, 128));
        assert!(config.save_state);
    }

    #[test]
    fn test_unknown_camera_rejected_by_parser() {
        let result =
            multicapture_command().try_get_matches_from(["multicapture", "--camera", "spiral"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gso_defaults() {
        let matches = gso_command()
            .try_get_matches_from(["gso_views", "--job-dir", "out/17"])
            .unwrap();
        let config = gso_config_from_matches(&matches).unwrap();
        assert_eq!(config.frame_end, 22);
        assert_eq!(config.resolution, (512, 512));
        assert_eq!(config.resolve_asset_index().unwrap(), 17);
    }

    #[test]
    fn test_inconsistent_flags_fail_validation() {
        let matches = multicapture_command()
            .try_get_matches_from(["multicapture", "--min_num_dynamic_objects", "5"])
            .unwrap();
        assert!(scene_config_from_matches(&matches).is_err());
    }
}
