//! Day/night bursty activity for a single simulated entity.
//!
//! The entity alternates between ACTIVE and INACTIVE periods and, while in
//! either, emits ACTION events at exponential intervals. Each entity has
//! its own sunrise and sunset; at night time runs slower by a dilation
//! factor, so sessions start rarely and actions thin out.
//!
//! Events are stepped by hand instead of through a priority queue because
//! crossing a sun boundary rescales the pending deadlines. Only INACTIVE
//! deadlines are rescaled at a boundary; an ACTIVE session that straddles
//! sunrise or sunset keeps its deadlines.
//!
//! Per-entity parameters are drawn as a whole from a seed
//! ([`DiurnalParameters::draw`]). Entity `k` of a machine always uses the
//! seed-tree node `machine / k`, so any entity's trajectory can be replayed
//! on its own.

use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp1, Gamma, StandardNormal};
use synth_core::{BurstsConfig, ResolvedBursts};
use tracing::{debug, error, warn};

/// Length of the day/night cycle in milliseconds.
pub const ONE_DAY_MS: f64 = synth_core::units::DAY_MS;

/// Factors above this are logged as extreme.
const EXTREME_FACTOR: f64 = 1e4;

/// Non-finite factors are clamped here so deadline arithmetic stays finite.
const FACTOR_CEILING: f64 = 1e12;

/// Time of day in `[0, ONE_DAY_MS)` for an absolute time.
pub fn time_of_day(t: f64) -> f64 {
    t.rem_euclid(ONE_DAY_MS)
}

/// Start of the day containing `t`.
pub fn day_origin(t: f64) -> f64 {
    t - time_of_day(t)
}

/// True when `time_of_day` lies in `[sunrise, sunset)`, wrapping midnight.
pub fn is_daytime(time_of_day: f64, sunrise: f64, sunset: f64) -> bool {
    if sunrise <= sunset {
        time_of_day >= sunrise && time_of_day < sunset
    } else {
        time_of_day >= sunrise || time_of_day < sunset
    }
}

/// Hyper-parameters shared by every entity of a machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DiurnalConfig {
    /// Simulation start, epoch ms
    pub start_ms: f64,
    /// Simulation end, epoch ms
    pub end_ms: Option<f64>,
    /// Mean of the per-entity mean action interval, ms
    pub mean_interval_ms: f64,
    /// Offset past sun boundaries and floor on every delay, ms
    pub min_offset_ms: f64,
    /// Mean of the per-entity mean active-period length, ms
    pub active_mean_ms: f64,
    /// Mean of the per-entity mean inactive-period length, ms
    pub inactive_mean_ms: f64,
    /// Gamma shape of log dilation
    pub dilation_shape: f64,
    /// Gamma scale of log dilation
    pub dilation_scale: f64,
    /// Gamma shape of log idle multiplier
    pub idle_shape: f64,
    /// Gamma scale of log idle multiplier
    pub idle_scale: f64,
    /// Population mode of sunrise, ms after midnight UTC
    pub sunrise_mean_ms: f64,
    /// Spread of sunrise, ms
    pub sunrise_sd_ms: f64,
    /// Night length, ms
    pub night_length_ms: f64,
    /// Step cap per record
    pub max_steps: u64,
}

impl DiurnalConfig {
    /// Build from a validated bursts definition.
    pub fn from_resolved(resolved: &ResolvedBursts, config: &BurstsConfig) -> Self {
        Self {
            start_ms: resolved.start_ms,
            end_ms: resolved.end_ms,
            mean_interval_ms: resolved.mean_interval_ms,
            min_offset_ms: resolved.min_offset_ms,
            active_mean_ms: resolved.active_mean_ms,
            inactive_mean_ms: resolved.inactive_mean_ms,
            dilation_shape: config.dilation_shape,
            dilation_scale: config.dilation_scale,
            idle_shape: config.idle_shape,
            idle_scale: config.idle_scale,
            sunrise_mean_ms: resolved.sunrise_mean_ms,
            sunrise_sd_ms: resolved.sunrise_sd_ms,
            night_length_ms: resolved.night_length_ms,
            max_steps: config.max_steps,
        }
    }
}

impl Default for DiurnalConfig {
    fn default() -> Self {
        let hour = synth_core::units::HOUR_MS;
        let minute = synth_core::units::MINUTE_MS;
        Self {
            // 2024-01-01T00:00:00Z
            start_ms: 1_704_067_200_000.0,
            end_ms: None,
            mean_interval_ms: minute,
            min_offset_ms: 1.0,
            active_mean_ms: 10.0 * minute,
            inactive_mean_ms: 4.0 * hour,
            dilation_shape: 6.0,
            dilation_scale: 1.0,
            idle_shape: 6.0,
            idle_scale: 1.0,
            sunrise_mean_ms: 19.0 * hour,
            sunrise_sd_ms: 5.0 * hour,
            night_length_ms: 19.0 * hour,
            max_steps: 10_000_000,
        }
    }
}

/// Hyper-distributions built once per machine.
#[derive(Debug, Clone)]
pub struct HyperParameters {
    config: DiurnalConfig,
    dilation: Gamma<f64>,
    idle: Gamma<f64>,
}

impl HyperParameters {
    /// Validate the gamma parameters and keep the config.
    pub fn new(config: DiurnalConfig) -> Result<Self, GeneratorError> {
        let gamma = |name: &str, shape: f64, scale: f64| {
            Gamma::new(shape, scale).map_err(|e| {
                GeneratorError::InvalidParameter(format!(
                    "{name} gamma({shape}, {scale}): {e}"
                ))
            })
        };
        Ok(Self {
            dilation: gamma("dilation", config.dilation_shape, config.dilation_scale)?,
            idle: gamma("idle", config.idle_shape, config.idle_scale)?,
            config,
        })
    }

    /// The underlying configuration.
    pub fn config(&self) -> &DiurnalConfig {
        &self.config
    }
}

/// Behavioural parameters of one entity. Immutable once drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalParameters {
    /// Seed the set was drawn from
    pub seed: u64,
    /// Night-time slow-down, >= 1
    pub dilation: f64,
    /// Slow-down of actions while inactive in daytime, >= 1
    pub idle: f64,
    /// Mean active-period length, ms
    pub mean_active_ms: f64,
    /// Mean inactive-period length, ms
    pub mean_inactive_ms: f64,
    /// Mean interval between actions, ms
    pub mean_interval_ms: f64,
    /// Sunrise, ms after midnight UTC
    pub sunrise_ms: f64,
    /// Sunset, ms after midnight UTC
    pub sunset_ms: f64,
}

impl DiurnalParameters {
    /// Draw a full parameter set. A pure function of `hyper` and `seed`.
    pub fn draw(hyper: &HyperParameters, seed: u64) -> Self {
        use rand::SeedableRng;

        let config = &hyper.config;
        let mut rng = StdRng::seed_from_u64(seed);
        let floor = config.min_offset_ms;

        let dilation = guard_factor("dilation", hyper.dilation.sample(&mut rng).exp(), seed);
        let idle = guard_factor("idle", hyper.idle.sample(&mut rng).exp(), seed);
        let mean_active_ms = (config.active_mean_ms * exp1(&mut rng)).max(floor);
        let mean_inactive_ms = (config.inactive_mean_ms * exp1(&mut rng)).max(floor);
        let mean_interval_ms = (config.mean_interval_ms * exp1(&mut rng)).max(floor);

        let z: f64 = StandardNormal.sample(&mut rng);
        let sunrise_ms = time_of_day(config.sunrise_mean_ms + config.sunrise_sd_ms * z);
        let sunset_ms = time_of_day(sunrise_ms - config.night_length_ms);

        Self {
            seed,
            dilation,
            idle,
            mean_active_ms,
            mean_inactive_ms,
            mean_interval_ms,
            sunrise_ms,
            sunset_ms,
        }
    }
}

fn exp1(rng: &mut StdRng) -> f64 {
    Exp1.sample(rng)
}

fn guard_factor(name: &str, value: f64, seed: u64) -> f64 {
    if !value.is_finite() || value > EXTREME_FACTOR {
        warn!(factor = name, value, seed, "Extreme per-entity factor");
    }
    if value.is_finite() {
        value
    } else {
        FACTOR_CEILING
    }
}

/// Events produced by [`DiurnalActivityStateMachine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiurnalEvent {
    /// Night turned to day
    Sunrise,
    /// Day turned to night
    Sunset,
    /// An active period began
    Activate,
    /// An active period ended
    Deactivate,
    /// The entity acted; the only visible event
    Action,
    /// The configured end time has passed
    End,
}

/// Mutable simulation state of the current entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalState {
    /// Current simulated time, epoch ms
    pub now: f64,
    /// In an active period
    pub is_active: bool,
    /// Between the entity's sunrise and sunset
    pub is_daytime: bool,
    /// Next ACTIVE/INACTIVE flip, epoch ms
    pub next_transition: f64,
    /// Next action, epoch ms
    pub next_query: f64,
}

/// Event-stepping simulation of one entity at a time.
///
/// When the end time is reached, [`restart`](Self::restart) moves on to the
/// next entity with freshly drawn parameters and rewinds to the start.
#[derive(Debug)]
pub struct DiurnalActivityStateMachine {
    hyper: HyperParameters,
    node: SeedNode,
    entity: u64,
    params: DiurnalParameters,
    rng: StdRng,
    state: DiurnalState,
}

impl DiurnalActivityStateMachine {
    /// Create a machine positioned at the start of entity 0.
    pub fn new(config: DiurnalConfig, node: SeedNode) -> Result<Self, GeneratorError> {
        let hyper = HyperParameters::new(config)?;
        Ok(Self::for_entity(hyper, node, 0))
    }

    /// Create a machine positioned at the start of entity `entity`.
    pub fn for_entity(hyper: HyperParameters, node: SeedNode, entity: u64) -> Self {
        let entity_node = node.child(entity);
        let params = DiurnalParameters::draw(&hyper, entity_node.child("parameters").derived_seed());
        let start = hyper.config.start_ms;
        let mut machine = Self {
            rng: entity_node.child("trajectory").random_generator(),
            hyper,
            node,
            entity,
            params,
            state: DiurnalState {
                now: start,
                is_active: false,
                is_daytime: false,
                next_transition: start,
                next_query: start,
            },
        };
        machine.rewind();
        machine
    }

    /// Move to the next entity: redraw every parameter and rewind to start.
    pub fn restart(&mut self) {
        self.entity += 1;
        let entity_node = self.node.child(self.entity);
        self.params =
            DiurnalParameters::draw(&self.hyper, entity_node.child("parameters").derived_seed());
        self.rng = entity_node.child("trajectory").random_generator();
        self.rewind();
        debug!(
            entity = self.entity,
            dilation = self.params.dilation,
            idle = self.params.idle,
            sunrise_h = self.params.sunrise_ms / 3_600_000.0,
            "Restarted diurnal entity"
        );
    }

    fn rewind(&mut self) {
        let start = self.hyper.config.start_ms;
        self.state.now = start;
        self.state.is_daytime =
            is_daytime(time_of_day(start), self.params.sunrise_ms, self.params.sunset_ms);
        // entities start inactive
        self.state.is_active = false;
        self.state.next_transition = self.next_transition_time();
        self.state.next_query = self.next_query_time();
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.state.now
    }

    /// Current state.
    pub fn state(&self) -> &DiurnalState {
        &self.state
    }

    /// Parameters of the current entity.
    pub fn params(&self) -> &DiurnalParameters {
        &self.params
    }

    /// Index of the current entity.
    pub fn entity(&self) -> u64 {
        self.entity
    }

    /// Machine configuration.
    pub fn config(&self) -> &DiurnalConfig {
        &self.hyper.config
    }

    /// Advance by one event.
    pub fn step(&mut self) -> DiurnalEvent {
        if self.past_end() {
            return DiurnalEvent::End;
        }

        let p = self.params;
        self.state.is_daytime = is_daytime(time_of_day(self.state.now), p.sunrise_ms, p.sunset_ms);

        let (boundary, event, scale) = if self.state.is_daytime {
            (self.next_boundary(p.sunset_ms), DiurnalEvent::Sunset, p.dilation)
        } else {
            (self.next_boundary(p.sunrise_ms), DiurnalEvent::Sunrise, 1.0 / p.dilation)
        };

        if boundary < self.state.next_transition {
            if boundary < self.state.next_query {
                self.cross_sun_boundary(boundary, event, scale)
            } else {
                self.action()
            }
        } else if self.state.next_transition < self.state.next_query {
            self.state.now = self.state.now.max(self.state.next_transition);
            self.flip_activation()
        } else {
            self.action()
        }
    }

    /// Step until the next action or the end.
    ///
    /// `steps` accumulates across calls so a caller can cap the work spent
    /// on one record, restarts included.
    pub fn next_action(&mut self, steps: &mut u64) -> Result<Option<f64>, GeneratorError> {
        let limit = self.hyper.config.max_steps;
        loop {
            *steps += 1;
            if *steps > limit {
                error!(
                    limit,
                    entity = self.entity,
                    now = self.state.now,
                    "Diurnal step limit exceeded"
                );
                return Err(GeneratorError::StepLimitExceeded { limit });
            }
            match self.step() {
                DiurnalEvent::Action => return Ok(Some(self.state.now)),
                DiurnalEvent::End => return Ok(None),
                _ => {}
            }
        }
    }

    /// First occurrence of `offset` (a time of day) strictly after now.
    fn next_boundary(&self, offset: f64) -> f64 {
        let now = self.state.now;
        let mut t = day_origin(now) + offset;
        while t <= now {
            t += ONE_DAY_MS;
        }
        t
    }

    fn cross_sun_boundary(&mut self, t: f64, event: DiurnalEvent, scale: f64) -> DiurnalEvent {
        let now = t + self.hyper.config.min_offset_ms;
        self.state.now = now;
        if !self.state.is_active {
            self.state.next_query = now + scale * (self.state.next_query - now).max(0.0);
            self.state.next_transition = now + scale * (self.state.next_transition - now).max(0.0);
        }
        self.state.is_daytime = !self.state.is_daytime;
        event
    }

    fn action(&mut self) -> DiurnalEvent {
        self.state.now = self.state.now.max(self.state.next_query);
        if self.past_end() {
            // actions never land after the window
            return DiurnalEvent::End;
        }
        self.state.next_query = self.next_query_time();
        DiurnalEvent::Action
    }

    fn past_end(&self) -> bool {
        self.hyper
            .config
            .end_ms
            .is_some_and(|end| self.state.now > end)
    }

    fn flip_activation(&mut self) -> DiurnalEvent {
        self.state.is_active = !self.state.is_active;
        self.state.next_query = self.next_query_time();
        self.state.next_transition = self.next_transition_time();
        if self.state.is_active {
            DiurnalEvent::Activate
        } else {
            DiurnalEvent::Deactivate
        }
    }

    fn delay(&mut self, mean: f64) -> f64 {
        (mean * exp1(&mut self.rng)).max(self.hyper.config.min_offset_ms)
    }

    fn next_transition_time(&mut self) -> f64 {
        let delay = if self.state.is_active {
            self.delay(self.params.mean_active_ms)
        } else {
            let delay = self.delay(self.params.mean_inactive_ms);
            if self.state.is_daytime {
                delay
            } else {
                delay * self.params.dilation
            }
        };
        self.state.now + delay
    }

    fn next_query_time(&mut self) -> f64 {
        let delay = self.delay(self.params.mean_interval_ms);
        let factor = if !self.state.is_daytime {
            self.params.dilation
        } else if !self.state.is_active {
            self.params.idle
        } else {
            1.0
        };
        self.state.now + delay * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;

    const HOUR: f64 = 3_600_000.0;

    fn window(days: f64) -> DiurnalConfig {
        let config = DiurnalConfig::default();
        DiurnalConfig {
            end_ms: Some(config.start_ms + days * ONE_DAY_MS),
            ..config
        }
    }

    fn machine(config: DiurnalConfig, seed: u64) -> DiurnalActivityStateMachine {
        let node = HierarchicalSeedTree::new(seed).child("bursts");
        DiurnalActivityStateMachine::new(config, node).unwrap()
    }

    #[test]
    fn test_time_helpers() {
        assert_eq!(time_of_day(ONE_DAY_MS + 5.0), 5.0);
        assert_eq!(time_of_day(-1.0), ONE_DAY_MS - 1.0);
        assert_eq!(day_origin(3.0 * ONE_DAY_MS + 7.0), 3.0 * ONE_DAY_MS);

        // plain window
        assert!(is_daytime(10.0 * HOUR, 6.0 * HOUR, 18.0 * HOUR));
        assert!(!is_daytime(20.0 * HOUR, 6.0 * HOUR, 18.0 * HOUR));
        // window across midnight
        assert!(is_daytime(23.0 * HOUR, 19.0 * HOUR, 0.0));
        assert!(is_daytime(1.0 * HOUR, 22.0 * HOUR, 3.0 * HOUR));
        assert!(!is_daytime(12.0 * HOUR, 22.0 * HOUR, 3.0 * HOUR));
    }

    #[test]
    fn test_parameters_are_pure_function_of_seed() {
        let hyper = HyperParameters::new(DiurnalConfig::default()).unwrap();
        let a = DiurnalParameters::draw(&hyper, 99);
        let b = DiurnalParameters::draw(&hyper, 99);
        let c = DiurnalParameters::draw(&hyper, 100);
        assert_eq!(a, b);
        assert_ne!(a, c);

        assert!(a.dilation >= 1.0 && a.idle >= 1.0);
        assert!((0.0..ONE_DAY_MS).contains(&a.sunrise_ms));
        let day_length = time_of_day(a.sunset_ms - a.sunrise_ms);
        assert!((day_length - 5.0 * HOUR).abs() < 1e-3, "{day_length}");
    }

    #[test]
    fn test_invalid_gamma_rejected() {
        let config = DiurnalConfig {
            dilation_shape: -1.0,
            ..DiurnalConfig::default()
        };
        assert!(matches!(
            HyperParameters::new(config),
            Err(GeneratorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_now_is_monotonic() {
        let mut m = machine(window(3.0), 1);
        let mut last = m.now();
        let mut entity = m.entity();
        for _ in 0..200_000 {
            match m.step() {
                DiurnalEvent::End => {
                    m.restart();
                    entity = m.entity();
                    last = m.now();
                    assert_eq!(last, m.config().start_ms);
                }
                _ => {
                    assert_eq!(m.entity(), entity);
                    assert!(m.now() >= last, "time went back: {} < {}", m.now(), last);
                    last = m.now();
                }
            }
        }
    }

    #[test]
    fn test_actions_cluster_in_daytime() {
        let mut m = machine(window(5.0), 2);
        let mut inside = 0u64;
        let mut outside = 0u64;
        let mut steps = 0u64;

        while inside + outside < 20_000 {
            match m.next_action(&mut steps).unwrap() {
                Some(t) => {
                    let config = m.config();
                    assert!(t >= config.start_ms && t <= config.end_ms.unwrap());
                    let p = m.params();
                    if is_daytime(time_of_day(t), p.sunrise_ms, p.sunset_ms) {
                        inside += 1;
                    } else {
                        outside += 1;
                    }
                }
                None => {
                    m.restart();
                    steps = 0;
                }
            }
        }

        let total = (inside + outside) as f64;
        let day_density = inside as f64 / total / 5.0;
        let night_density = outside as f64 / total / 19.0;
        assert!(inside > outside, "inside {inside}, outside {outside}");
        assert!(
            day_density > 4.0 * night_density,
            "day {day_density}, night {night_density}"
        );
    }

    #[test]
    fn test_end_is_reached_for_pathological_dilation() {
        let config = DiurnalConfig {
            dilation_shape: 800.0,
            idle_shape: 800.0,
            ..window(5.0)
        };
        let mut m = machine(config, 3);
        assert_eq!(m.params().dilation, FACTOR_CEILING);

        let mut steps = 0u64;
        while m.next_action(&mut steps).unwrap().is_some() {}
        assert!(steps <= 10_000_000, "{steps} steps");
        assert_eq!(m.step(), DiurnalEvent::End);
    }

    #[test]
    fn test_night_rescaling_only_while_inactive() {
        let mut m = machine(window(10.0), 4);
        for _ in 0..100_000 {
            let before = *m.state();
            match m.step() {
                DiurnalEvent::Sunset | DiurnalEvent::Sunrise => {
                    let after = *m.state();
                    assert_ne!(before.is_daytime, after.is_daytime);
                    if before.is_active {
                        assert_eq!(before.next_query, after.next_query);
                        assert_eq!(before.next_transition, after.next_transition);
                    }
                }
                DiurnalEvent::End => m.restart(),
                _ => {}
            }
        }
    }

    #[test]
    fn test_step_limit_is_fatal() {
        // a one-millisecond window never contains an action, so every
        // entity ends empty and the cap trips
        let base = DiurnalConfig::default();
        let config = DiurnalConfig {
            end_ms: Some(base.start_ms + 1.0),
            mean_interval_ms: ONE_DAY_MS,
            max_steps: 1_000,
            ..base
        };
        let mut m = machine(config, 5);
        let mut steps = 0;
        let result = loop {
            match m.next_action(&mut steps) {
                Ok(Some(t)) => panic!("unexpected action at {t}"),
                Ok(None) => m.restart(),
                Err(e) => break e,
            }
        };
        assert!(matches!(
            result,
            GeneratorError::StepLimitExceeded { limit: 1_000 }
        ));
    }

    #[test]
    fn test_entity_replay() {
        let config = window(2.0);
        let node = HierarchicalSeedTree::new(6).child("bursts");
        let mut m = DiurnalActivityStateMachine::new(config.clone(), node.clone()).unwrap();
        m.restart();
        m.restart();

        let hyper = HyperParameters::new(config).unwrap();
        let mut replay = DiurnalActivityStateMachine::for_entity(hyper, node, 2);
        assert_eq!(m.params(), replay.params());

        let mut a = 0;
        let mut b = 0;
        for _ in 0..50 {
            assert_eq!(m.next_action(&mut a).unwrap(), replay.next_action(&mut b).unwrap());
        }
    }
}
