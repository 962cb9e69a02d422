//! `restore`: reconstruct combined shader sources from packed materials.
//!
//! Each material restores independently, so the work fans out over a small
//! pool of worker threads fed from a channel. Jobs are sorted by file size
//! descending as a cheap complexity estimate, which keeps the pool busy at
//! the tail of the run.

use anyhow::{Context, Result, bail};
use crossbeam_channel::unbounded;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use core_decompile::{RestoreConfig, TracingObserver, restore_shaders, restore_varying};
use core_material::{Material, MaterialError, ShaderPlatform, ShaderStage};

use super::{collect_packed, material_stem};

pub struct RestoreArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub timeout: Option<f64>,
    pub max_workers: Option<usize>,
    pub split_passes: bool,
    pub merge_stages: bool,
    pub no_processing: bool,
}

/// Restored sources target the ESSL payloads, which are plain text on every
/// material observed in the wild.
const RESTORE_PLATFORMS: [ShaderPlatform; 2] =
    [ShaderPlatform::Essl310, ShaderPlatform::Essl300];

pub fn run(args: &RestoreArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output)?;

    let mut jobs: Vec<(PathBuf, u64)> = collect_packed(&args.inputs)?
        .into_iter()
        .map(|path| {
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            (path, size)
        })
        .collect();
    jobs.sort_by(|a, b| b.1.cmp(&a.1));

    let workers = args
        .max_workers
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1);

    let (job_sender, job_receiver) = unbounded::<PathBuf>();
    for (path, _) in jobs {
        job_sender.send(path).expect("queue is open");
    }
    drop(job_sender);

    let mut failures: Vec<(PathBuf, anyhow::Error)> = Vec::new();
    std::thread::scope(|scope| {
        let (result_sender, result_receiver) = unbounded();
        for _ in 0..workers {
            let job_receiver = job_receiver.clone();
            let result_sender = result_sender.clone();
            scope.spawn(move || {
                for path in job_receiver.iter() {
                    let outcome = restore_single_material(&path, args);
                    result_sender
                        .send((path, outcome))
                        .expect("result channel is open");
                }
            });
        }
        drop(result_sender);

        for (path, outcome) in result_receiver.iter() {
            if let Err(error) = outcome {
                warn!(material = %path.display(), error = %format!("{error:#}"), "restore failed");
                failures.push((path, error));
            }
        }
    });

    if !failures.is_empty() {
        bail!("failed to restore {} material(s)", failures.len());
    }
    Ok(())
}

fn restore_single_material(path: &Path, args: &RestoreArgs) -> Result<()> {
    let stem = material_stem(path);
    info!(material = %stem, "restoring");

    let mut material = match Material::load_file(path) {
        Ok(material) => material,
        Err(MaterialError::Encrypted { scheme }) => {
            warn!(
                material = %stem,
                scheme,
                "material is encrypted; this tool cannot restore encrypted shaders"
            );
            return Ok(());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    material.passes.sort_by(|a, b| a.name.cmp(&b.name));
    material.sort_variants();

    let timeout = args.timeout.map(Duration::from_secs_f64);

    let varying = restore_varying(&material, timeout, &TracingObserver);
    if varying.is_empty() {
        info!(
            material = %stem,
            "no input or output declarations found; skipping varying.def.sc"
        );
    } else {
        std::fs::write(args.output.join(format!("{stem}.varying.def.sc")), varying)?;
    }

    let config = RestoreConfig {
        split_passes: args.split_passes,
        merge_stages: args.merge_stages,
        preprocess: !args.no_processing,
        search_timeout: timeout,
    };
    let restored = restore_shaders(
        &material,
        &RESTORE_PLATFORMS,
        &ShaderStage::ALL,
        &config,
        &TracingObserver,
    )?;

    for shader in restored {
        let mut tokens = vec![stem.clone()];
        if args.split_passes {
            tokens.push(shader.pass_name.clone());
        }
        tokens.push(shader.platform.name().to_string());
        if !args.merge_stages {
            tokens.push(shader.stage.name().to_string());
        }
        tokens.push(
            if args.no_processing {
                shader.platform.file_extension()
            } else {
                "sc"
            }
            .to_string(),
        );
        std::fs::write(args.output.join(tokens.join(".")), shader.code)?;
    }
    Ok(())
}
