use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::math::{GeoPoint, Vec3};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewports::SceneConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve, project and pick against a multi-view scene file")]
struct Args {
    /// Scene file (JSON): canvas, view_state and views
    scene: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every resolved viewport and the overlapping pairs
    Layout,

    /// Project a world point (or, with --geo, longitude latitude altitude) into a view
    #[command(allow_negative_numbers = true)]
    Project {
        /// View id
        #[arg(long)]
        view: String,

        x: f64,
        y: f64,
        #[arg(default_value_t = 0.0)]
        z: f64,

        /// Interpret x y z as longitude, latitude (degrees) and altitude (meters)
        #[arg(long)]
        geo: bool,
    },

    /// Map a canvas pixel inside a view to the world plane z = Z
    #[command(allow_negative_numbers = true)]
    Unproject {
        /// View id
        #[arg(long)]
        view: String,

        x: f64,
        y: f64,

        /// Target plane height in world units (default: ground)
        #[arg(long)]
        z: Option<f64>,
    },

    /// Find the views whose ground lies under a canvas pixel
    #[command(allow_negative_numbers = true)]
    Pick {
        x: f64,
        y: f64,

        /// Report every view under the pixel, topmost first
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let scene = SceneConfig::load(&args.scene)?;
    info!(
        "loaded {} with {} views",
        args.scene.display(),
        scene.views.len()
    );
    let manager = tools::open_scene(&scene)?;

    let report = match args.command {
        Command::Layout => tools::layout_report(&manager).ok_or("scene has no layout")?,
        Command::Project {
            view,
            x,
            y,
            z,
            geo,
        } => {
            let vp = manager
                .viewport(&view)
                .ok_or_else(|| format!("unknown view `{view}`"))?;
            if geo {
                tools::project_geo_report(vp, GeoPoint::new(x, y, z))
                    .ok_or_else(|| format!("view `{view}` has no geographic frame"))?
            } else {
                tools::project_report(vp, Vec3::new(x, y, z))
            }
        }
        Command::Unproject { view, x, y, z } => {
            let vp = manager
                .viewport(&view)
                .ok_or_else(|| format!("unknown view `{view}`"))?;
            tools::unproject_report(vp, x, y, z)
        }
        Command::Pick { x, y, all } => tools::pick_report(&manager, x, y, all),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
