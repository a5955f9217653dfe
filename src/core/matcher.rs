use crate::core::pricing::PriceResolver;
use crate::domain::model::{CatalogEntry, CatalogMap, DeploymentOption};
use crate::domain::ports::CatalogSource;
use crate::utils::error::Result;

/// Which price the matcher must be able to resolve for a candidate.
#[derive(Debug, Clone)]
pub enum PriceRequest<'a> {
    Compute,
    Database {
        engine: &'a str,
        deployment: DeploymentOption,
    },
}

/// A capacity match together with the price that proved it usable. The
/// assembler reuses this price instead of issuing a second identical query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedInstance {
    pub instance_type: String,
    pub price_per_month: f64,
}

/// Scans the catalog in ascending (vCPU, memory, name) order and returns the
/// first instance type that covers the requirement and has a resolvable
/// price. Candidates with sufficient capacity but no listed price are
/// skipped, so the winner is the smallest *priced* adequate instance.
pub async fn match_instance<C: CatalogSource>(
    catalog: &CatalogMap,
    required_vcpu: u32,
    required_memory_gb: f64,
    resolver: &PriceResolver<'_, C>,
    service_code: &str,
    request: PriceRequest<'_>,
    storage_gb: f64,
) -> Result<Option<MatchedInstance>> {
    let mut candidates: Vec<&CatalogEntry> = catalog.values().collect();
    candidates.sort_by(|a, b| {
        a.vcpu
            .cmp(&b.vcpu)
            .then(a.memory_gb.total_cmp(&b.memory_gb))
            .then(a.instance_type.cmp(&b.instance_type))
    });

    for entry in candidates {
        if entry.vcpu < required_vcpu || entry.memory_gb < required_memory_gb {
            continue;
        }

        let price = match &request {
            PriceRequest::Compute => {
                resolver
                    .compute_monthly(service_code, &entry.instance_type, storage_gb)
                    .await?
            }
            PriceRequest::Database { engine, deployment } => {
                resolver
                    .database_monthly(
                        service_code,
                        &entry.instance_type,
                        engine,
                        *deployment,
                        storage_gb,
                    )
                    .await?
            }
        };

        if let Some(price_per_month) = price {
            tracing::info!(
                "✅ Matched {} for specs vCPU: {}, Memory: {}",
                entry.instance_type,
                required_vcpu,
                required_memory_gb
            );
            return Ok(Some(MatchedInstance {
                instance_type: entry.instance_type.clone(),
                price_per_month,
            }));
        }

        tracing::debug!(
            "Candidate {} covers vCPU: {}, Memory: {} but has no price, skipping",
            entry.instance_type,
            required_vcpu,
            required_memory_gb
        );
    }

    tracing::warn!(
        "❌ No match found for specs vCPU: {}, Memory: {}",
        required_vcpu,
        required_memory_gb
    );
    Ok(None)
}
