use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::monitor::SystemMonitor;

pub struct EstimateEngine<P: Pipeline> {
    pipeline: P,
    #[cfg(feature = "cli")]
    monitor: Option<SystemMonitor>,
}

impl<P: Pipeline> EstimateEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            #[cfg(feature = "cli")]
            monitor: None,
        }
    }

    #[cfg(feature = "cli")]
    pub fn new_with_monitoring(pipeline: P, enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: enabled.then(|| SystemMonitor::new(true)),
        }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting cost estimation...");

        // Extract
        println!("Fetching catalogs and loading inventory...");
        let source_data = self.pipeline.extract().await?;
        println!(
            "Loaded {} inventory rows, {} compute and {} database instance types",
            source_data.inventory.len(),
            source_data.compute_catalog.len(),
            source_data
                .database_catalogs
                .values()
                .map(|c| c.len())
                .sum::<usize>()
        );
        #[cfg(feature = "cli")]
        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Extract");
        }

        // Transform
        println!("Matching instances and resolving prices...");
        let result = self.pipeline.transform(source_data).await?;
        println!("Priced {} service recommendations", result.quotes.len());
        #[cfg(feature = "cli")]
        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Transform");
        }

        // Load
        println!("Writing report...");
        let output_path = self.pipeline.load(result).await?;
        println!("Output saved to: {}", output_path);
        #[cfg(feature = "cli")]
        if let Some(monitor) = &self.monitor {
            monitor.log_final_stats();
        }

        Ok(output_path)
    }
}
