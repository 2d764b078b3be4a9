use candle_core::Device;

use candle_minigc::datasets::{GraphDataset, MiniGcDataset};
use candle_minigc::models::{GcnClassifier, GraphClassifier};
use candle_minigc::{ExperimentConfig, TrainParams, Trainer};

// cargo run --release --example minigc
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let device = Device::cuda_if_available(0)?;

    let config = ExperimentConfig {
        train: TrainParams {
            show_progress: true,
            ..Default::default()
        },
        ..Default::default()
    };
    config.validate()?;
    log::info!("{:?}", config);

    // build datasets
    let train_set = MiniGcDataset::new(config.train_params())?;
    let test_set = MiniGcDataset::new(config.test_params())?;
    log::info!(
        "{} training graphs, {} test graphs",
        train_set.len(),
        test_set.len()
    );

    // preview one sample
    let (graph, label) = train_set.get(0);
    println!("{} {}", graph, label);
    let dot_path = "minigc_sample.dot";
    std::fs::write(dot_path, graph.to_dot(&format!("Class: {}", label)))?;
    log::info!("wrote {} (render with `dot -Tpng {} -o sample.png`)", dot_path, dot_path);

    // create a GCN model
    let model = GcnClassifier::from_variant(
        config.variant,
        config.hidden_dim,
        train_set.num_classes(),
        &device,
    )?;
    log::info!(
        "{:?} model with {} parameter tensors",
        config.variant,
        model.parameters().len()
    );

    // training loop
    let mut trainer = Trainer::new(config.train.clone(), &device);
    trainer.fit(&model, &train_set, &test_set, |report| println!("{}", report))?;
    Ok(())
}
