use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::runtime::Tokio;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::metrics;

const SERVICE_NAME: &str = "binder-api";

pub struct Observability {
    pub registry: Registry,
    tracer_provider: Option<TracerProvider>,
}

impl Observability {
    /// Build the metrics registry and install the global tracing subscriber.
    ///
    /// Spans are exported over OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT`
    /// is set.
    pub fn init() -> Result<Self> {
        let registry = Registry::new_custom(Some("binder".into()), None)?;
        metrics::register_all(&registry)?;

        let otel_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let tracer_provider = match &otel_endpoint {
            Some(endpoint) => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(endpoint.clone())
                    .build()?;

                Some(
                    TracerProvider::builder()
                        .with_batch_exporter(exporter, Tokio)
                        .with_resource(Resource::new(vec![KeyValue::new(
                            "service.name",
                            SERVICE_NAME,
                        )]))
                        .build(),
                )
            }
            None => None,
        };

        let otel_layer = tracer_provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME))
        });

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "binder_api=debug,tower_http=debug".into());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(otel_layer)
            .init();

        match &otel_endpoint {
            Some(endpoint) => {
                tracing::info!("Observability stack initialized (Prometheus + OTel → {})", endpoint)
            }
            None => {
                tracing::info!("Observability stack initialized (Prometheus, OTel export disabled)")
            }
        }

        Ok(Self {
            registry,
            tracer_provider,
        })
    }

    /// Flush pending spans.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {err}");
            }
        }
    }
}
