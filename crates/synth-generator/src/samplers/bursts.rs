//! Timestamped actions with day/night clustering.
//!
//! Each record is one action (or `events` actions) of the current simulated
//! entity. Successive records walk forward through that entity's timeline;
//! once it reaches the end of the window the next entity takes over from
//! the start. A record is never emitted with fewer actions than configured:
//! when the window runs out halfway, the record is rebuilt from scratch on
//! the next entity.

use super::{FieldSampler, Sampler};
use crate::diurnal::{DiurnalActivityStateMachine, DiurnalConfig};
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use synth_core::{BurstsConfig, FieldMap, SampledValue, TimeFormat};
use tracing::debug;

/// `time`, `timestamp_ms` and `timestamp_s` for the action at `t`.
///
/// The instant is snapped to the resolution of `format` so the text and
/// the numbers name the same moment.
pub(crate) fn time_fields(format: &TimeFormat, t: f64) -> FieldMap {
    let ms = format.snap(t.floor() as i64);
    let mut fields = FieldMap::new();
    fields.insert("time".to_string(), format.format(ms).into());
    fields.insert("timestamp_ms".to_string(), ms.into());
    fields.insert("timestamp_s".to_string(), ms.div_euclid(1000).into());
    fields
}

#[derive(Debug)]
pub struct BurstsSampler {
    machine: DiurnalActivityStateMachine,
    format: TimeFormat,
    events: usize,
    flatten: bool,
    inner: Option<Box<FieldSampler>>,
}

impl BurstsSampler {
    pub fn new(config: &BurstsConfig, node: SeedNode, path: &str) -> Result<Self, GeneratorError> {
        let resolved = config.resolve(path)?;
        let inner = match &config.value {
            Some(value) => Some(Box::new(FieldSampler::build(
                value,
                node.child("value"),
                &format!("{path}.value"),
            )?)),
            None => None,
        };
        let machine = DiurnalActivityStateMachine::new(
            DiurnalConfig::from_resolved(&resolved, config),
            node.child("entities"),
        )?;
        Ok(Self {
            machine,
            format: resolved.format,
            events: config.events.max(1),
            flatten: config.flatten,
            inner,
        })
    }

    /// The underlying state machine.
    pub fn machine(&self) -> &DiurnalActivityStateMachine {
        &self.machine
    }

    /// Collect `events` action times, restarting on a fresh entity whenever
    /// the window ends first.
    fn next_actions(&mut self) -> Result<Vec<f64>, GeneratorError> {
        let mut steps = 0u64;
        let mut times = Vec::with_capacity(self.events);
        while times.len() < self.events {
            match self.machine.next_action(&mut steps)? {
                Some(t) => times.push(t),
                None => {
                    if !times.is_empty() {
                        debug!(
                            collected = times.len(),
                            wanted = self.events,
                            "Window ended mid-record, rebuilding on next entity"
                        );
                    }
                    times.clear();
                    self.machine.restart();
                }
            }
        }
        Ok(times)
    }

    fn stamp(&self, value: SampledValue, t: f64) -> SampledValue {
        let mut time_fields = time_fields(&self.format, t);
        match value {
            SampledValue::Object(mut fields) if self.flatten => {
                fields.extend(time_fields);
                SampledValue::Object(fields)
            }
            other => {
                time_fields.insert("value".to_string(), other);
                SampledValue::Object(time_fields)
            }
        }
    }
}

impl Sampler for BurstsSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        let times = self.next_actions()?;

        let mut stamped = Vec::with_capacity(times.len());
        for t in times {
            let value = match self.inner.as_mut() {
                Some(inner) => inner.sample(index)?,
                None => SampledValue::empty_object(),
            };
            stamped.push(self.stamp(value, t));
        }

        if self.events == 1 {
            Ok(stamped.pop().unwrap_or_else(SampledValue::empty_object))
        } else {
            Ok(SampledValue::Array(stamped))
        }
    }
}
