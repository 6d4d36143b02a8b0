use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod dict;
mod error;
mod log;
mod mesh;
mod model;
mod render;
mod series;
mod transfer;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "foamcase")]
#[command(
    about = "Case preparation and post-processing for a cross-flow turbine CFD case",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Dropbox,
    Figshare,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the two AMI patches in constant/polyMesh/boundary as a cyclicAMI pair.
    FixCyclics {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        #[arg(long, value_delimiter = ',', default_value = "AMI1,AMI2")]
        patches: Vec<String>,

        #[arg(long, default_value_t = 0.0001)]
        tolerance: f64,

        #[arg(long, default_value = "noOrdering")]
        transform: String,
    },

    /// Generate system/sampleDict with one profile set per z/H section.
    SampleDict {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        /// JSON sampling config; defaults apply to missing fields.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print instead of writing system/sampleDict.
        #[arg(long)]
        stdout: bool,
    },

    /// Regenerate missing or empty <time>/uniform/time files.
    FixTimes {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        #[arg(long, default_value_t = 0.002)]
        dt: f64,
    },

    /// Split the single snapped wall layer into geometric sublayers.
    RefineWalls {
        #[arg(long, value_delimiter = ',', default_value = "shaft,blades")]
        patches: Vec<String>,

        #[arg(long, default_value_t = 16)]
        nlayers: usize,

        #[arg(long, default_value_t = 1.25)]
        expansion: f64,

        #[arg(long)]
        dry_run: bool,
    },

    /// Reduce torque, drag and rotor kinematics to TSR, C_P and C_D.
    Perf {
        /// forces.dat, a plain `time torque drag` file, or a directory of <time>/forces.dat.
        #[arg(long)]
        forces: PathBuf,

        /// `time theta_deg omega` file.
        #[arg(long)]
        kinematics: PathBuf,

        #[arg(long)]
        rig: Option<PathBuf>,

        #[arg(long, default_value_t = 360.0)]
        theta0: f64,

        #[arg(long)]
        inertial: bool,

        #[arg(long)]
        export_csv: Option<PathBuf>,

        /// Print the report as JSON instead of the text summary.
        #[arg(long)]
        json: bool,
    },

    /// Time-average the sampled profiles into wake maps (one CSV per field).
    Wake {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        #[arg(long, default_value_t = 3.0)]
        t1: f64,

        /// Field group of the profile files, e.g. `U_vorticity`.
        #[arg(long)]
        group: Option<String>,

        #[arg(long)]
        rig: Option<PathBuf>,

        #[arg(long, default_value = "processed")]
        out: PathBuf,
    },

    /// Latest-time mean velocity and TKE maps from the averaged fields.
    Maps {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        /// u, v or w
        #[arg(long, default_value = "u")]
        component: String,

        /// resolved, modeled or total
        #[arg(long, default_value = "total")]
        tke: String,

        /// Also write the resolved/modeled/total k profile at this z/H.
        #[arg(long)]
        z_h: Option<f64>,

        #[arg(long)]
        rig: Option<PathBuf>,

        #[arg(long, default_value = "processed")]
        out: PathBuf,
    },

    /// Append mean performance and case settings to the cumulative log.
    LogPerf {
        #[arg(long)]
        forces: PathBuf,

        #[arg(long)]
        kinematics: PathBuf,

        #[arg(long, default_value = ".")]
        case: PathBuf,

        #[arg(long)]
        rig: Option<PathBuf>,

        #[arg(long, default_value_t = 360.0)]
        theta0: f64,

        #[arg(long, default_value = "blades")]
        wall_patch: String,

        #[arg(long, default_value = "processed/all_perf.csv")]
        csv: PathBuf,
    },

    /// Print the scraped case settings as JSON.
    CaseInfo {
        #[arg(long, default_value = ".")]
        case: PathBuf,

        #[arg(long, default_value = "blades")]
        wall_patch: String,

        /// Also read the mean-momentum recovery terms from log.funkyDoCalc.*
        #[arg(long)]
        recovery: bool,
    },

    /// Compress and upload results missing from the remote store.
    Upload {
        #[arg(long, value_enum)]
        backend: Backend,

        /// Figshare article id.
        #[arg(long)]
        article: Option<String>,

        /// Dropbox folder; defaults to /OpenFOAM/solvedCases/<case name>.
        #[arg(long)]
        remote_dir: Option<String>,

        #[arg(long, default_value = ".")]
        case: PathBuf,

        /// Publish the Figshare article after each upload.
        #[arg(long)]
        publish: bool,
    },

    /// Download and unpack results missing locally.
    Download {
        #[arg(long, value_enum)]
        backend: Backend,

        #[arg(long)]
        article: Option<String>,

        #[arg(long)]
        remote_dir: Option<String>,

        #[arg(long, default_value = ".")]
        case: PathBuf,
    },
}

fn load_rig(path: Option<&Path>) -> Result<config::RigGeometry> {
    config::load_or_default::<config::RigGeometry>(path)?.validate()
}

fn load_series(forces: &Path, kinematics: &Path) -> Result<model::AlignedSeries> {
    let loaded = if forces.is_dir() {
        series::forces::load_forces_dir(forces)
    } else {
        let text = fs::read_to_string(forces)
            .with_context(|| format!("read forces {}", forces.display()))?;
        series::read_forces(&text, &forces.display().to_string())
    };
    let f = loaded.with_context(|| format!("load forces from {}", forces.display()))?;

    let k = series::Kinematics::read(kinematics)
        .with_context(|| format!("load kinematics from {}", kinematics.display()))?;
    Ok(model::AlignedSeries::align(&f, &k))
}

fn open_store(
    backend: Backend,
    article: Option<String>,
    remote_dir: Option<String>,
    case: &Path,
    publish: bool,
) -> Result<Box<dyn transfer::RemoteStore>> {
    match backend {
        Backend::Dropbox => {
            let root = match remote_dir {
                Some(r) => r,
                None => {
                    let abs = case
                        .canonicalize()
                        .with_context(|| format!("resolve case directory {}", case.display()))?;
                    let name = abs
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .context("case directory has no name")?;
                    format!("/OpenFOAM/solvedCases/{}", name)
                }
            };
            let token = transfer::credentials::dropbox_token()?;
            Ok(Box::new(transfer::DropboxStore::new(&token, &root)))
        }
        Backend::Figshare => {
            let Some(article) = article else {
                bail!("--article is required for figshare");
            };
            // Public downloads work without credentials.
            let token = transfer::credentials::figshare_token().ok();
            Ok(Box::new(
                transfer::FigshareStore::new(&article, token).publish_after_upload(publish),
            ))
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::FixCyclics {
            case,
            patches,
            tolerance,
            transform,
        } => {
            let [first, second] = patches.as_slice() else {
                bail!("--patches needs exactly two names, got {:?}", patches);
            };
            let cfg = dict::CyclicAmi {
                tolerance,
                transform,
                ..dict::CyclicAmi::pair(first, second)
            };
            let path = case.join("constant/polyMesh/boundary");
            dict::patch_boundary_file(&path, &cfg)
                .with_context(|| format!("patch {}", path.display()))?;
            println!("Wrote {}", path.display());

            let text = fs::read_to_string(&path)?;
            for name in &cfg.patches {
                let (n_faces, start_face) = dict::patch::captured_values(&text, name, cfg.window)?;
                println!("  {}: nFaces {}, startFace {}", name, n_faces, start_face);
            }
        }

        Commands::SampleDict {
            case,
            config: config_path,
            stdout,
        } => {
            let cfg: dict::SampleDictConfig = config::load_or_default(config_path.as_deref())?;
            let text = dict::render_sample_dict(&cfg);
            if stdout {
                print!("{}", text);
            } else {
                let path = case.join("system/sampleDict");
                fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::FixTimes { case, dt } => {
            if dt <= 0.0 {
                bail!("--dt must be positive");
            }
            let fixed = dict::times::repair_time_files(&case, dt)
                .with_context(|| format!("repair time files under {}", case.display()))?;
            println!("Fixed {} time file(s)", fixed.len());
        }

        Commands::RefineWalls {
            patches,
            nlayers,
            expansion,
            dry_run,
        } => {
            if expansion <= 0.0 {
                bail!("--expansion must be positive");
            }
            let ratios = mesh::layer_split_ratios(nlayers, expansion);
            let runs = mesh::refine_wall_layers(&patches, &ratios, dry_run)?;
            println!("{} refinement pass(es){}", runs, if dry_run { " (dry run)" } else { "" });
        }

        Commands::Perf {
            forces,
            kinematics,
            rig,
            theta0,
            inertial,
            export_csv,
            json,
        } => {
            let rig = load_rig(rig.as_deref())?;
            let series = load_series(&forces, &kinematics)?;
            let opts = model::PerfOptions {
                start_angle_deg: theta0,
                inertial,
            };
            let report = model::reduce_performance(&series, &rig, &opts)?;
            if let Some(path) = export_csv {
                render::write_perf_series(&path, &report)?;
                tracing::info!(path = %path.display(), "performance series written");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                render::print_perf_summary(&report);
            }
        }

        Commands::Wake {
            case,
            t1,
            group,
            rig,
            out,
        } => {
            let rig = load_rig(rig.as_deref())?;
            let opts = model::WakeOptions {
                t1,
                group,
                ..model::WakeOptions::default()
            };
            let sets = case.join("postProcessing/sets");
            let wake = model::reduce_wake(&sets, &opts, &rig)
                .with_context(|| format!("reduce wake from {}", sets.display()))?;
            for path in render::write_wake_map(&out, &wake)? {
                println!("Wrote {}", path.display());
            }
            if !wake.incomplete.is_empty() {
                println!(
                    "{} section file(s) lacked an optional column and were zero-filled",
                    wake.incomplete.len()
                );
            }
        }

        Commands::Maps {
            case,
            component,
            tke,
            z_h,
            rig,
            out,
        } => {
            let rig = load_rig(rig.as_deref())?;
            let sets = case.join("postProcessing/sets");
            let component: model::profile::Component = component.parse()?;
            let amount: model::profile::TkeAmount = tke.parse()?;

            let vel = model::profile::velocity_map(&sets, component, &rig)?;
            let vel_path = out.join(format!("vel_map_{:?}.csv", component).to_lowercase());
            render::write_field_map(&vel_path, &vel)?;
            println!("Wrote {}", vel_path.display());

            let k = model::profile::tke_map(&sets, amount, &rig)?;
            let k_path = out.join(format!("k_map_{:?}.csv", amount).to_lowercase());
            render::write_field_map(&k_path, &k)?;
            println!("Wrote {}", k_path.display());

            if let Some(z_h) = z_h {
                let profile = model::profile::tke_profile(&sets, z_h, &rig)?;
                let path = out.join(format!("k_profile_{}.csv", dict::foam_float(z_h)));
                render::write_tke_profile(&path, &profile)?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::LogPerf {
            forces,
            kinematics,
            case,
            rig,
            theta0,
            wall_patch,
            csv,
        } => {
            let rig = load_rig(rig.as_deref())?;
            let series = load_series(&forces, &kinematics)?;
            let opts = model::PerfOptions {
                start_angle_deg: theta0,
                inertial: false,
            };
            let report = model::reduce_performance(&series, &rig, &opts)?;
            render::print_perf_summary(&report);

            let summary = log::collect_case_summary(&case, &wall_patch)?;
            let row = render::PerfLogRow::new(&summary, &report.outcome);
            render::append_perf_log(&csv, &row)?;
            println!("Appended to {}", csv.display());
        }

        Commands::CaseInfo {
            case,
            wall_patch,
            recovery,
        } => {
            let summary = log::collect_case_summary(&case, &wall_patch)?;
            let mut value = serde_json::to_value(&summary)?;
            if recovery {
                let terms = log::read_recovery_terms(&case)?;
                value["recovery"] = serde_json::to_value(terms)?;
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::Upload {
            backend,
            article,
            remote_dir,
            case,
            publish,
        } => {
            let store = open_store(backend, article, remote_dir, &case, publish)?;
            let opts = transfer::UploadOptions::default();
            let report = transfer::upload_all(store.as_ref(), &case, &opts)?;
            println!(
                "Uploaded {}, skipped {}",
                report.transferred.len(),
                report.skipped.len()
            );
        }

        Commands::Download {
            backend,
            article,
            remote_dir,
            case,
        } => {
            let store = open_store(backend, article, remote_dir, &case, false)?;
            let report = transfer::download_all(store.as_ref(), &case)?;
            println!(
                "Downloaded {}, skipped {}",
                report.transferred.len(),
                report.skipped.len()
            );
        }
    }

    Ok(())
}
