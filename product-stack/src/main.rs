use product_stack::config::StackConfig;
use product_stack::engine::{LocalEngine, ProvisioningEngine};
use product_stack::schema::{SchemaError, SchemaSource};
use product_stack::stack::{self, ProductStackProps};
use product_stack::synth;
use stack_core::error::AppError;
use stack_core::observability::init_tracing;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "product-stack failed");
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = StackConfig::from_env()?;

    init_tracing(&config.stack_name, &config.log_level, config.common.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        stack = %config.stack_name,
        environment = ?config.environment,
        account = %config.target.account,
        region = %config.target.region,
        "Starting product-stack"
    );

    let schema_file = config.schema_file();
    let sdl = tokio::fs::read_to_string(&schema_file)
        .await
        .map_err(|source| SchemaError::Io {
            path: schema_file.clone(),
            source,
        })?;
    let schema = SchemaSource::from_definition(config.schema_path.clone(), &sdl)?;
    tracing::info!(
        path = %schema_file.display(),
        operations = schema.catalog.operation_count(),
        "Schema loaded"
    );

    let props = ProductStackProps::new(config.stack_name.clone(), schema, chrono::Utc::now());
    let composition = stack::declare(&props)?;

    let template = synth::synthesize(&composition);
    tokio::fs::create_dir_all(&config.common.synth_dir).await?;
    let template_path = config
        .common
        .synth_dir
        .join(format!("{}.template.json", composition.stack_name()));
    tokio::fs::write(&template_path, serde_json::to_vec_pretty(&template)?).await?;
    tracing::info!(path = %template_path.display(), "Template written");

    let engine = LocalEngine::new(&config.asset_root);
    let deployment = engine.deploy(&composition, &config.target).await?;

    // stdout carries only the outputs document
    println!("{}", serde_json::to_string_pretty(&deployment.outputs)?);
    Ok(())
}
