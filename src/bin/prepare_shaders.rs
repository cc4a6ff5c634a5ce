use std::path::PathBuf;

use shdc_cross::build_tasks::{self, Config};
use shdc_cross::errmsg::ErrFormat;
use shdc_cross::slang::Slang;
use shdc_cross::util::manifest_path;

fn env_flag(name: &str) -> bool {
    match std::env::var(name).ok() {
        None => false,
        Some(s) if s.is_empty() => false,
        Some(s) if s.to_lowercase() == "false" || s == "0" => false,
        _ => true,
    }
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(name).map_or(default, PathBuf::from)
}

pub fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let targets = match std::env::var("SHDC_TARGETS") {
        Ok(s) if !s.trim().is_empty() => s
            .split(',')
            .map(|name| name.parse::<Slang>())
            .collect::<Result<Vec<_>, _>>()?,
        _ => vec![Slang::Wgpu],
    };

    let err_format = if env_flag("SHDC_MSVC_ERRORS") {
        ErrFormat::Msvc
    } else {
        ErrFormat::Gcc
    };

    let config = Config {
        manifest_path: env_path("SHDC_MANIFEST", manifest_path(["shaders", "bundle.json"])),
        compiled_shaders_dir: env_path("SHDC_OUTPUT_DIR", manifest_path(["shaders", "compiled"])),
        targets,
        write_debug_dump: env_flag("SHDC_DUMP"),
        err_format,
    };

    build_tasks::write_precompiled_shaders(&config)
}
