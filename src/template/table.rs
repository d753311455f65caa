// src/template/table.rs

use std::collections::HashMap;

use tracing::warn;

use crate::config::TemplateConfig;
use crate::errors::{ActivityError, Result};
use crate::progress::TemplateProgress;
use crate::template::{ConditionTemplate, ShopTemplate, SignInTemplate, Template, TemplateSlot};
use crate::types::TemplateKind;

/// Builds one template from its config and (matching) stored progress.
pub type TemplateCtor =
    fn(TemplateSlot, &TemplateConfig, Option<TemplateProgress>) -> Result<Template>;

/// Kind -> constructor lookup. Owned by whoever builds activity instances;
/// there is no process-wide table.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    ctors: HashMap<TemplateKind, TemplateCtor>,
}

impl Default for TemplateTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(TemplateKind::Condition, build_condition);
        table.register(TemplateKind::SignIn, build_sign_in);
        table.register(TemplateKind::Shop, build_shop);
        table
    }
}

impl TemplateTable {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: TemplateKind, ctor: TemplateCtor) {
        self.ctors.insert(kind, ctor);
    }

    pub fn is_registered(&self, kind: TemplateKind) -> bool {
        self.ctors.contains_key(&kind)
    }

    /// Construct the template at `slot`.
    ///
    /// Stored progress of another variant is discarded and the template
    /// starts from its zero value.
    pub fn build(
        &self,
        slot: TemplateSlot,
        config: &TemplateConfig,
        progress: Option<TemplateProgress>,
    ) -> Result<Template> {
        let kind = config.kind();
        let ctor = self
            .ctors
            .get(&kind)
            .ok_or(ActivityError::UnregisteredTemplate(kind))?;

        let progress = match progress {
            Some(p) if p.kind() != kind => {
                warn!(
                    day = slot.day,
                    index = slot.index,
                    stored = ?p.kind(),
                    configured = ?kind,
                    "stored template progress does not match config; resetting"
                );
                None
            }
            other => other,
        };

        ctor(slot, config, progress)
    }
}

fn build_condition(
    slot: TemplateSlot,
    config: &TemplateConfig,
    progress: Option<TemplateProgress>,
) -> Result<Template> {
    let TemplateConfig::Condition(config) = config else {
        return Err(mismatch(TemplateKind::Condition, config));
    };
    let progress = match progress {
        Some(TemplateProgress::Condition(p)) => Some(p),
        _ => None,
    };
    Ok(Template::Condition(ConditionTemplate::new(
        slot,
        config.clone(),
        progress,
    )))
}

fn build_sign_in(
    slot: TemplateSlot,
    config: &TemplateConfig,
    progress: Option<TemplateProgress>,
) -> Result<Template> {
    let TemplateConfig::SignIn(config) = config else {
        return Err(mismatch(TemplateKind::SignIn, config));
    };
    let progress = match progress {
        Some(TemplateProgress::SignIn(p)) => Some(p),
        _ => None,
    };
    Ok(Template::SignIn(SignInTemplate::new(
        slot,
        config.clone(),
        progress,
    )))
}

fn build_shop(
    slot: TemplateSlot,
    config: &TemplateConfig,
    progress: Option<TemplateProgress>,
) -> Result<Template> {
    let TemplateConfig::Shop(config) = config else {
        return Err(mismatch(TemplateKind::Shop, config));
    };
    let progress = match progress {
        Some(TemplateProgress::Shop(p)) => Some(p),
        _ => None,
    };
    Ok(Template::Shop(ShopTemplate::new(slot, config.clone(), progress)))
}

fn mismatch(expected: TemplateKind, config: &TemplateConfig) -> ActivityError {
    ActivityError::ConfigError(format!(
        "constructor for {expected:?} called with {:?} config",
        config.kind()
    ))
}
