// Pre-flight validation
//
// Runs before auto-start: verifies the control surface is reachable, makes
// sure the four required scenes exist (creating missing ones; creation never
// overwrites), installs the failover media source, and checks the content
// catalog is reachable and non-empty.

use std::sync::Arc;

use tracing::{error, info, warn};

use steadycast_core::{ContentCatalog, ControlSurface};

use crate::config::OrchestratorConfig;

/// One named validation check
#[derive(Debug, Clone)]
pub struct PreflightCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: Option<String>,
}

impl PreflightCheck {
    fn pass(name: &'static str) -> Self {
        info!(check = name, "preflight check passed");
        Self {
            name,
            passed: true,
            detail: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        error!(check = name, detail = %detail, "preflight check failed");
        Self {
            name,
            passed: false,
            detail: Some(detail),
        }
    }
}

/// Results of a pre-flight validation run
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub checks: Vec<PreflightCheck>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn check(&self, name: &str) -> Option<&PreflightCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Whether the checks a broadcast cannot start without are green
    /// (catalog emptiness is reported but handled by the sequencer's
    /// failover path instead of blocking startup)
    pub fn startable(&self) -> bool {
        self.checks
            .iter()
            .filter(|c| c.name != "catalog_populated")
            .all(|c| c.passed)
    }
}

/// Run all pre-flight checks
pub async fn run_preflight(
    surface: &Arc<dyn ControlSurface>,
    catalog: &Arc<dyn ContentCatalog>,
    config: &OrchestratorConfig,
) -> PreflightReport {
    info!("preflight validation starting");
    let mut checks = Vec::new();

    // Surface connectivity; connect if not already connected
    let connected = if surface.is_connected().await {
        true
    } else {
        match surface.connect().await {
            Ok(()) => true,
            Err(e) => {
                checks.push(PreflightCheck::fail("surface_connectivity", e.to_string()));
                false
            }
        }
    };
    if connected {
        checks.push(PreflightCheck::pass("surface_connectivity"));
    }

    // Required scenes exist; create missing ones
    if connected {
        let mut missing_failures = Vec::new();
        for scene in config.scenes.required() {
            match surface.scene_exists(scene).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(scene, "required scene missing; creating");
                    if let Err(e) = surface.create_scene(scene).await {
                        missing_failures.push(format!("{scene}: {e}"));
                    }
                }
                Err(e) => missing_failures.push(format!("{scene}: {e}")),
            }
        }
        if missing_failures.is_empty() {
            checks.push(PreflightCheck::pass("scenes_exist"));
        } else {
            checks.push(PreflightCheck::fail(
                "scenes_exist",
                missing_failures.join("; "),
            ));
        }

        // Failover media installed on the failover scene
        if config.failover_media_path.is_empty() {
            checks.push(PreflightCheck::fail(
                "failover_media",
                "no failover media path configured",
            ));
        } else {
            match surface
                .upsert_media_source(
                    &config.scenes.failover,
                    "Failover Player",
                    &config.failover_media_path,
                    true,
                )
                .await
            {
                Ok(()) => checks.push(PreflightCheck::pass("failover_media")),
                Err(e) => checks.push(PreflightCheck::fail("failover_media", e.to_string())),
            }
        }
    }

    // Catalog reachable and non-empty
    match catalog.list_items().await {
        Ok(items) if items.is_empty() => {
            checks.push(PreflightCheck::fail("catalog_populated", "catalog is empty"));
        }
        Ok(items) => {
            info!(count = items.len(), "content catalog reachable");
            checks.push(PreflightCheck::pass("catalog_populated"));
        }
        Err(e) => checks.push(PreflightCheck::fail("catalog_populated", e.to_string())),
    }

    let report = PreflightReport { checks };
    info!(
        passed = report.all_passed(),
        startable = report.startable(),
        "preflight validation finished"
    );
    report
}
