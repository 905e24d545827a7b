//! lesion-abcde CLI: segment a dermoscopy image and print its ABCDE scores.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lesion_abcde::{
    LesionAnalyzer,
    error::Result,
    report::JsonReport,
    risk::{ClinicalInputs, DiameterBucket},
    segmentation::ModelConfig,
};
use log::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiameterArg {
    /// Under 6 mm.
    Under6,
    /// 6 mm or more.
    #[value(name = "6-or-more")]
    SixOrMore,
}

impl From<DiameterArg> for DiameterBucket {
    fn from(arg: DiameterArg) -> Self {
        match arg {
            DiameterArg::Under6 => DiameterBucket::UnderSixMm,
            DiameterArg::SixOrMore => DiameterBucket::SixMmOrMore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lesion-abcde")]
#[command(version)]
#[command(about = "Score a skin lesion on the ABCDE melanoma heuristic (demo, not a diagnosis)")]
struct Cli {
    /// Dermoscopy image to analyze.
    #[arg(long)]
    image: Option<PathBuf>,

    /// D: lesion diameter.
    #[arg(long, value_enum, default_value_t = DiameterArg::Under6)]
    diameter: DiameterArg,

    /// E: the lesion has been changing.
    #[arg(long)]
    evolving: bool,

    /// Where to write the segmentation overlay (PNG).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Where to write a JSON report.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Segmentation model parameters (JSON).
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let model_config = ModelConfig {
        checkpoint: cli.checkpoint.clone(),
    };
    let mut analyzer = LesionAnalyzer::from_model_config(&model_config)?;

    let inputs = ClinicalInputs::new(cli.diameter.into(), cli.evolving);
    let image = match &cli.image {
        Some(path) => Some(image::open(path)?.to_rgb8()),
        None => None,
    };

    let output = analyzer.analyze(image.as_ref(), inputs.diameter, inputs.evolving)?;

    println!("A: Asymmetry  {:.3}", output.asymmetry);
    println!("B: Border     {:.3}", output.border);
    println!("C: Color      {:.3}", output.color);
    println!("{}", output.judgment);

    if let (Some(path), Some(_)) = (&cli.out, &output.overlay) {
        output.save_overlay(path)?;
        info!("Overlay written to {}", path.display());
    }

    if let Some(path) = &cli.json {
        let report = JsonReport::new(&output, &inputs);
        std::fs::write(path, report.to_json()?)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
