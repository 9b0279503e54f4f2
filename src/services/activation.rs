use super::toggle::ModToggleService;
use crate::error::SyncError;
use crate::models::{Mod, ModProfile};
use crate::state::StateStore;

/// A mod the activation could not bring to its target state.
#[derive(Debug)]
pub struct ActivationFailure {
    pub file_name: String,
    pub error: SyncError,
}

/// What one profile activation did.
#[derive(Debug, Default)]
pub struct ActivationReport {
    /// Mods whose state changed, in their new state.
    pub toggled: Vec<Mod>,
    pub failed: Vec<ActivationFailure>,
    /// Profile members with no matching jar in `mods/`.
    pub missing: Vec<String>,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.missing.is_empty()
    }
}

/// Reconciles the live mod directory against a saved [`ModProfile`].
#[derive(Clone)]
pub struct ProfileActivation {
    toggles: ModToggleService,
    store: StateStore,
}

impl ProfileActivation {
    pub fn new(toggles: ModToggleService, store: StateStore) -> Self {
        Self { toggles, store }
    }

    /// Enable exactly the mods the profile lists and disable the rest.
    ///
    /// Mods already in the target state are left alone, so applying the same
    /// profile twice toggles nothing the second time. A failing mod does not
    /// stop the others.
    pub async fn load_mod_profile(&self, profile: &ModProfile) -> ActivationReport {
        let live = self.store.read(|state| state.mods.clone());
        let mut report = ActivationReport::default();

        for m in &live {
            let should_enable = profile.contains(&m.file_name);
            if should_enable == !m.disabled {
                continue;
            }
            match self.toggles.set_mod_enabled(m, should_enable).await {
                Ok(Some(updated)) => report.toggled.push(updated),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!("Could not apply {} to {}: {}", profile.name, m.file_name, error);
                    report.failed.push(ActivationFailure {
                        file_name: m.file_name.clone(),
                        error,
                    });
                }
            }
        }

        report.missing = profile
            .mods
            .iter()
            .filter(|wanted| !live.iter().any(|m| m.file_name == wanted.file_name))
            .map(|wanted| wanted.file_name.clone())
            .collect();

        tracing::info!(
            "Loaded mod profile '{}': {} toggled, {} failed, {} missing",
            profile.name,
            report.toggled.len(),
            report.failed.len(),
            report.missing.len()
        );
        report
    }
}
