//! Random task payloads drawn from weighted presets, plus lookup of
//! predefined tasks.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use crate::config::{GeneratorConfig, PredefinedTask, TaskPreset};
use crate::core::error::DispatchError;
use crate::core::task::TaskSpec;
use crate::util::serde::{PayloadKind, TaskPayload};

/// Builds [`TaskSpec`]s for new tasks.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    presets: Vec<TaskPreset>,
    money_chance: f32,
    money_reward: u32,
    predefined: Vec<PredefinedTask>,
}

impl TaskGenerator {
    /// Create a generator from configuration.
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            presets: config.presets.clone(),
            money_chance: config.money_chance.clamp(0.0, 1.0),
            money_reward: config.money_reward,
            predefined: config.predefined.clone(),
        }
    }

    /// Configured presets.
    pub fn presets(&self) -> &[TaskPreset] {
        &self.presets
    }

    /// Draw a random task.
    ///
    /// Every task carries an entity; money is added when a roll in `0..1`
    /// lands below the money chance.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TaskSpec, DispatchError> {
        let preset = self
            .presets
            .choose_weighted(rng, |p| p.weight)
            .map_err(|e| DispatchError::InvalidConfig(format!("cannot pick a preset: {e}")))?;

        let mut payload = TaskPayload {
            kinds: vec![PayloadKind::Entity],
            reward: 0,
            experience: preset.experience,
            entity: preset.entities.choose(rng).cloned(),
            preset: Some(preset.name.clone()),
        };
        if rng.random::<f32>() < self.money_chance {
            payload.kinds.push(PayloadKind::Money);
            payload.reward = self.money_reward;
        }

        debug!(preset = %preset.name, money = payload.reward, "generated task");
        Ok(TaskSpec {
            base_duration: preset.duration_secs,
            special: false,
            payload,
        })
    }

    /// Look up a predefined task by name.
    pub fn predefined(&self, name: &str) -> Result<&PredefinedTask, DispatchError> {
        self.predefined
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DispatchError::UnknownPreset(name.to_string()))
    }

    /// Spec for a predefined task.
    pub fn predefined_spec(task: &PredefinedTask) -> TaskSpec {
        TaskSpec {
            base_duration: task.duration_secs,
            special: false,
            payload: TaskPayload {
                kinds: task.kinds.clone(),
                reward: task.money_reward,
                experience: task.experience,
                entity: task.entity.clone(),
                preset: Some(task.name.clone()),
            },
        }
    }
}
