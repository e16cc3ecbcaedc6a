//! Engine counters on a private prometheus registry.
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    pub resolutions: IntCounter,
    pub cache_hits: IntCounter,
    pub invalid_marks: IntCounter,
    pub fallback_hits: IntCounter,
    pub sealing_warnings: IntCounter,
    pub transformation_failures: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        Ok(Self {
            resolutions: counter(&registry, "unitload_resolutions_total", "resolve calls")?,
            cache_hits: counter(
                &registry,
                "unitload_cache_hits_total",
                "resolutions answered from the resolved-unit cache",
            )?,
            invalid_marks: counter(
                &registry,
                "unitload_invalid_marks_total",
                "names marked invalid after a failed resolution",
            )?,
            fallback_hits: counter(
                &registry,
                "unitload_fallback_hits_total",
                "resolutions answered by a child environment",
            )?,
            sealing_warnings: counter(
                &registry,
                "unitload_sealing_warnings_total",
                "namespace sealing inconsistencies",
            )?,
            transformation_failures: counter(
                &registry,
                "unitload_transformation_failures_total",
                "transformer chain failures",
            )?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

impl std::fmt::Debug for EngineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineMetrics")
            .field("resolutions", &self.resolutions.get())
            .field("cache_hits", &self.cache_hits.get())
            .field("invalid_marks", &self.invalid_marks.get())
            .finish()
    }
}
