//! FHIR Cloud Lambda entry point.

use std::sync::Arc;

use fhircloud_deployment::fhir_config::LOG_LEVEL;
use fhircloud_deployment::{
    DeploymentSettings, ServerlessAdapter, Services, assemble_fhir_config, generic_resources,
    init_logging,
};
use fhircloud_routing::generate_router;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = DeploymentSettings::from_env()?;
    init_logging(LOG_LEVEL);

    info!(
        adapter_variant = ?settings.adapter_variant,
        offline = settings.is_offline(),
        "Starting FHIR Cloud"
    );

    let services = Services::connect(&settings).await?;
    let config = Arc::new(assemble_fhir_config(&settings, &services)?);
    let router = generate_router(config, generic_resources());
    let adapter = Arc::new(ServerlessAdapter::new(
        router,
        settings.adapter_variant,
        settings.tracking_id_key.clone(),
    ));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let adapter = Arc::clone(&adapter);
        async move { adapter.handle_event(event).await }
    }))
    .await
}
