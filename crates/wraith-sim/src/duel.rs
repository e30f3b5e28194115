//! Scripted player-versus-enemy duel.
//!
//! Stands in for the engine: kinematic bodies, an animation layer that plays
//! fixed-length clips through the scheduler and reports their callbacks back,
//! a camera that re-aims at the enemy, and a weapon reach check that turns
//! live hitboxes into contacts. The player is driven by a small script; the
//! enemy runs its own decision engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, trace};
use wraith_combat::{
    params, AbilityKind, AnimationCallback, AnimationSink, AttackKind, CombatConfig, CombatEvent,
    Contact, Delay, EnemyAgent, EventBus, FlatHierarchy, ForceMode, LookAt, PhysicsBody,
    PlayerCharacter, PlayerContext, PlayerInput, PlayerStateId, Routine, RoutineId, RoutineStatus,
    Scheduler, SpatialFrame,
};
use wraith_common::{flatten, planar_distance, EntityId, Vec2, Vec3};

use crate::config::{RunSettings, SimConfig};
use crate::timing::FrameClock;

const PLAYER: EntityId = EntityId::from_raw(1);
const ENEMY: EntityId = EntityId::from_raw(2);

/// Seconds between camera re-aims.
const AIM_INTERVAL: f32 = 0.5;

/// One side of the duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fighter {
    /// Scripted player.
    Player,
    /// Enemy agent.
    Enemy,
}

impl Fighter {
    fn of(entity: EntityId) -> Self {
        if entity == PLAYER {
            Self::Player
        } else {
            Self::Enemy
        }
    }

    fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

// ============================================================================
// Bodies
// ============================================================================

#[derive(Debug, Default)]
struct BodyState {
    position: Vec3,
    velocity: Vec3,
}

/// Unit-mass point body shared between an actor and the duel.
#[derive(Debug, Clone)]
struct KinematicBody {
    state: Arc<Mutex<BodyState>>,
    fixed_dt: f32,
}

impl KinematicBody {
    fn new(position: Vec3, fixed_dt: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(BodyState {
                position,
                velocity: Vec3::ZERO,
            })),
            fixed_dt,
        }
    }

    fn position(&self) -> Vec3 {
        self.state.lock().position
    }

    fn integrate(&self) {
        let mut state = self.state.lock();
        let velocity = state.velocity;
        state.position += velocity * self.fixed_dt;
    }
}

impl PhysicsBody for KinematicBody {
    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        let mut state = self.state.lock();
        match mode {
            ForceMode::Force | ForceMode::Acceleration => state.velocity += force * self.fixed_dt,
            ForceMode::Impulse | ForceMode::VelocityChange => state.velocity += force,
        }
    }

    fn linear_velocity(&self) -> Vec3 {
        self.state.lock().velocity
    }
}

// ============================================================================
// Animation
// ============================================================================

/// Forwards triggers to the duel; parameters are only traced.
struct ScriptedAnimator {
    fighter: Fighter,
    triggers: Sender<(Fighter, String)>,
}

impl AnimationSink for ScriptedAnimator {
    fn play_trigger(&mut self, name: &str) {
        if self.triggers.send((self.fighter, name.to_string())).is_err() {
            trace!(fighter = ?self.fighter, name, "trigger dropped: duel gone");
        }
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        trace!(fighter = ?self.fighter, name, value, "anim bool");
    }

    fn set_int(&mut self, name: &str, value: i32) {
        trace!(fighter = ?self.fighter, name, value, "anim int");
    }

    fn set_float(&mut self, name: &str, value: f32) {
        trace!(fighter = ?self.fighter, name, value, "anim float");
    }
}

type Marks = Vec<(f32, AnimationCallback)>;

/// Plays one clip: fires each callback once its time has passed.
struct ClipPlayback {
    fighter: Fighter,
    elapsed: f32,
    marks: Marks,
    next: usize,
    callbacks: Sender<(Fighter, AnimationCallback)>,
}

impl Routine for ClipPlayback {
    fn resume(&mut self, dt: f32) -> RoutineStatus {
        self.elapsed += dt;
        while let Some(&(at, callback)) = self.marks.get(self.next) {
            if self.elapsed < at {
                return RoutineStatus::Pending;
            }
            self.next += 1;
            if self.callbacks.send((self.fighter, callback)).is_err() {
                return RoutineStatus::Done;
            }
        }
        RoutineStatus::Done
    }
}

fn swing_marks(duration: f32, combo: bool) -> Marks {
    let mut marks = vec![
        (duration * 0.3, AnimationCallback::WeaponHitboxEnabled),
        (duration * 0.6, AnimationCallback::WeaponHitboxDisabled),
        (duration, AnimationCallback::AttackFinished),
    ];
    if combo {
        marks.push((duration * 0.45, AnimationCallback::ComboWindowOpened));
        marks.push((duration * 0.8, AnimationCallback::ComboWindowClosed));
        marks.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    marks
}

/// Callback schedule of a clip, or `None` for clips that report nothing.
fn clip_marks(fighter: Fighter, trigger: &str, config: &CombatConfig) -> Option<Marks> {
    match fighter {
        Fighter::Player => [AttackKind::Light, AttackKind::Strong, AttackKind::JustAvoid]
            .into_iter()
            .find(|kind| kind.trigger_name() == trigger)
            .map(|kind| swing_marks(config.player.attacks.get(kind).duration, true)),
        Fighter::Enemy => {
            let attacks = &config.enemy.attacks;
            match trigger {
                t if t == AttackKind::Light.trigger_name() => {
                    Some(swing_marks(attacks.light.duration, false))
                },
                params::HEAVY_ATTACK => Some(swing_marks(attacks.heavy.duration, false)),
                params::BACKSTEP => Some(vec![(0.5, AnimationCallback::AttackFinished)]),
                params::HIT => Some(vec![(0.4, AnimationCallback::AttackFinished)]),
                _ => None,
            }
        },
    }
}

// ============================================================================
// Player Script
// ============================================================================

#[derive(Debug, Default)]
struct PlayerScript {
    ghost_timer: f32,
    heal_timer: f32,
    swings: u32,
}

impl PlayerScript {
    fn inputs(
        &mut self,
        player: &PlayerCharacter,
        enemy_attacking: bool,
        distance: f32,
        reach: f32,
        dt: f32,
    ) -> Vec<PlayerInput> {
        let ctx = player.machine().context();
        let health = player.health().ratio();
        let sacrificing = ctx.abilities().is_active(AbilityKind::SelfSacrifice);
        let mut inputs = Vec::new();

        match player.state() {
            PlayerStateId::Locomotion => {
                if !ctx.is_locked_on() {
                    inputs.push(PlayerInput::ToggleLockOn);
                }
                if sacrificing && health < 0.6 {
                    inputs.push(PlayerInput::Cancel);
                }
                if enemy_attacking && distance <= reach + 0.5 && ctx.can_afford(AbilityKind::Ghost) {
                    self.ghost_timer = 0.6;
                    inputs.push(PlayerInput::ToggleGhost);
                } else if health < 0.4 && !enemy_attacking && ctx.can_afford(AbilityKind::Heal) {
                    self.heal_timer = 1.5;
                    inputs.push(PlayerInput::ToggleHeal);
                } else if health > 0.9 && !sacrificing && ctx.focus().value() > 60.0 {
                    inputs.push(PlayerInput::ToggleSelfSacrifice);
                } else if distance > reach * 0.9 {
                    inputs.push(PlayerInput::Move(Vec2::new(0.0, 1.0)));
                    if distance > 6.0 && ctx.can_afford(AbilityKind::Sprint) {
                        inputs.push(PlayerInput::SprintPressed);
                    }
                } else {
                    inputs.push(PlayerInput::Move(Vec2::ZERO));
                    self.swings += 1;
                    inputs.push(if self.swings % 3 == 0 {
                        PlayerInput::StrongAttack
                    } else {
                        PlayerInput::LightAttack
                    });
                }
            },
            PlayerStateId::Dash => {
                if distance <= 4.0 {
                    inputs.push(PlayerInput::SprintReleased);
                }
            },
            PlayerStateId::LightAttack
            | PlayerStateId::StrongAttack
            | PlayerStateId::JustAvoidAttack => {
                let attacker = ctx.attacker();
                let max_combo = attacker
                    .kind()
                    .map_or(1, |kind| ctx.attack_profile(kind).max_combo);
                if !attacker.has_queued() && attacker.combo_step() < max_combo {
                    inputs.push(PlayerInput::LightAttack);
                }
            },
            PlayerStateId::Ghost => {
                self.ghost_timer -= dt;
                if ctx.just_avoid_armed() {
                    inputs.push(PlayerInput::LightAttack);
                } else if self.ghost_timer <= 0.0 {
                    inputs.push(PlayerInput::ToggleGhost);
                }
            },
            PlayerStateId::Heal => {
                self.heal_timer -= dt;
                if self.heal_timer <= 0.0 || (enemy_attacking && distance <= reach) {
                    inputs.push(PlayerInput::ToggleHeal);
                }
            },
            // Step out of the stance; the drain keeps running.
            PlayerStateId::SelfSacrifice => inputs.push(PlayerInput::Move(Vec2::new(0.0, 1.0))),
        }
        inputs
    }
}

// ============================================================================
// Duel
// ============================================================================

/// Result of one duel.
#[derive(Debug, Clone, PartialEq)]
pub struct DuelSummary {
    /// Simulated seconds.
    pub seconds: f32,
    /// Frames simulated.
    pub frames: u64,
    /// Side left standing, if anyone fell.
    pub winner: Option<Fighter>,
    /// Hits the player landed.
    pub player_hits: u32,
    /// Hits the enemy landed.
    pub enemy_hits: u32,
    /// Enemy hits evaded in ghost mode.
    pub evasions: u32,
    /// Enemy decisions taken.
    pub decisions: u32,
    /// Player health at the end.
    pub player_health: f32,
    /// Enemy health at the end.
    pub enemy_health: f32,
}

/// Everything one duel needs.
pub struct Duel {
    run: RunSettings,
    config: Arc<CombatConfig>,
    player: PlayerCharacter,
    enemy: EnemyAgent,
    player_body: KinematicBody,
    enemy_body: KinematicBody,
    camera: Arc<Mutex<Vec3>>,
    camera_turn: Option<RoutineId>,
    aim_timer: f32,
    scheduler: Scheduler,
    clips: [Option<RoutineId>; 2],
    triggers: Receiver<(Fighter, String)>,
    callbacks_tx: Sender<(Fighter, AnimationCallback)>,
    callbacks: Receiver<(Fighter, AnimationCallback)>,
    events: EventBus,
    script: PlayerScript,
    jitter: fastrand::Rng,
    finished: Arc<AtomicBool>,
    summary: DuelSummary,
}

impl Duel {
    /// Wire both fighters.
    pub fn new(config: SimConfig) -> anyhow::Result<Self> {
        let SimConfig { run, combat } = config;
        let combat = Arc::new(combat);
        let events = EventBus::default();
        let (triggers_tx, triggers) = unbounded();
        let (callbacks_tx, callbacks) = unbounded();

        let player_body = KinematicBody::new(Vec3::ZERO, run.fixed_dt);
        let enemy_body = KinematicBody::new(Vec3::new(0.0, 0.0, run.start_distance), run.fixed_dt);

        let ctx = PlayerContext::new(PLAYER, Arc::clone(&combat))?
            .with_animator(Box::new(ScriptedAnimator {
                fighter: Fighter::Player,
                triggers: triggers_tx.clone(),
            }))
            .with_body(Box::new(player_body.clone()))
            .with_events(events.clone());
        let player = PlayerCharacter::from_context(ctx);

        let enemy = EnemyAgent::new(ENEMY, Arc::clone(&combat), run.seed)?
            .with_animator(Box::new(ScriptedAnimator {
                fighter: Fighter::Enemy,
                triggers: triggers_tx,
            }))
            .with_body(Box::new(enemy_body.clone()))
            .with_events(events.clone());

        Ok(Self {
            jitter: fastrand::Rng::with_seed(run.seed.wrapping_add(1)),
            run,
            config: combat,
            player,
            enemy,
            player_body,
            enemy_body,
            camera: Arc::new(Mutex::new(Vec3::Z)),
            camera_turn: None,
            aim_timer: 0.0,
            scheduler: Scheduler::new(),
            clips: [None, None],
            triggers,
            callbacks_tx,
            callbacks,
            events,
            script: PlayerScript::default(),
            finished: Arc::new(AtomicBool::new(false)),
            summary: DuelSummary {
                seconds: 0.0,
                frames: 0,
                winner: None,
                player_hits: 0,
                enemy_hits: 0,
                evasions: 0,
                decisions: 0,
                player_health: 0.0,
                enemy_health: 0.0,
            },
        })
    }

    /// Run until someone falls (plus a short linger) or time runs out.
    pub fn run(mut self) -> DuelSummary {
        let mut clock = FrameClock::new(self.run.fixed_dt, self.run.max_dt);
        info!(
            distance = self.run.start_distance,
            seed = self.run.seed,
            "duel started"
        );

        while clock.elapsed() < self.run.max_seconds && !self.finished.load(Ordering::Acquire) {
            let wobble = self.run.frame_jitter * (self.jitter.f32() * 2.0 - 1.0);
            let (dt, steps) = clock.advance(self.run.frame_dt * (1.0 + wobble));
            self.frame(dt, steps);
        }

        self.scheduler.cancel_all();
        self.player.dispose();
        self.enemy.cancel();

        let mut summary = self.summary;
        summary.seconds = clock.elapsed();
        summary.frames = clock.frames();
        summary.player_health = self.player.health().value();
        summary.enemy_health = self.enemy.health().value();
        info!(
            winner = ?summary.winner,
            seconds = summary.seconds,
            player_hits = summary.player_hits,
            enemy_hits = summary.enemy_hits,
            evasions = summary.evasions,
            decisions = summary.decisions,
            player_health = summary.player_health,
            enemy_health = summary.enemy_health,
            frames = summary.frames,
            avg_frame_ms = clock.average_frame_time_ms(),
            "duel finished"
        );
        summary
    }

    fn frame(&mut self, dt: f32, steps: u32) {
        let p = self.player_body.position();
        let e = self.enemy_body.position();
        self.aim_camera(dt, p, e);

        let mut player_frame = SpatialFrame::at(p).with_camera(*self.camera.lock());
        if !self.enemy.is_dead() {
            player_frame = player_frame.with_target(e);
        }
        let mut enemy_frame = SpatialFrame::at(e);
        if !self.player.is_dead() {
            enemy_frame = enemy_frame.with_target(p);
        }

        let distance = planar_distance(p, e);
        let inputs = self.script.inputs(
            &self.player,
            self.enemy.attack().is_some(),
            distance,
            self.run.weapon_reach,
            dt,
        );
        for input in inputs {
            self.player.handle_input(input);
        }

        self.player.update(dt, &player_frame);
        self.enemy.update(dt, &enemy_frame);

        self.scheduler.tick(dt);
        self.play_clips();
        self.route_callbacks();

        for _ in 0..steps {
            self.player.fixed_update();
            self.enemy.fixed_update();
            self.player_body.integrate();
            self.enemy_body.integrate();
        }

        self.resolve_contacts();
        self.drain_events();
    }

    fn aim_camera(&mut self, dt: f32, player: Vec3, enemy: Vec3) {
        self.aim_timer -= dt;
        if self.aim_timer > 0.0 {
            return;
        }
        self.aim_timer = AIM_INTERVAL;
        if let Some(turn) = self.camera_turn.take() {
            self.scheduler.cancel(turn);
        }
        let direction = flatten(enemy - player);
        if direction != Vec3::ZERO {
            let (id, _) = self
                .scheduler
                .spawn(LookAt::new(Arc::clone(&self.camera), direction, 0.25));
            self.camera_turn = Some(id);
        }
    }

    fn play_clips(&mut self) {
        let fired: Vec<_> = self.triggers.try_iter().collect();
        for (fighter, trigger) in fired {
            let slot = &mut self.clips[fighter as usize];
            // A new clip interrupts the previous one.
            if let Some(previous) = slot.take() {
                self.scheduler.cancel(previous);
            }
            let Some(marks) = clip_marks(fighter, &trigger, &self.config) else {
                continue;
            };
            trace!(?fighter, trigger, "clip started");
            let (id, _) = self.scheduler.spawn(ClipPlayback {
                fighter,
                elapsed: 0.0,
                marks,
                next: 0,
                callbacks: self.callbacks_tx.clone(),
            });
            self.clips[fighter as usize] = Some(id);
        }
    }

    fn route_callbacks(&mut self) {
        let ready: Vec<_> = self.callbacks.try_iter().collect();
        for (fighter, callback) in ready {
            match fighter {
                Fighter::Player => self.player.on_animation(callback),
                Fighter::Enemy => self.enemy.on_animation(callback),
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let p = self.player_body.position();
        let e = self.enemy_body.position();
        if planar_distance(p, e) > self.run.weapon_reach {
            return;
        }
        let mut hits = Vec::new();

        let contact = Contact::new(ENEMY, e, flatten(p - e));
        self.player.report_contact(&contact, &FlatHierarchy, &mut hits);
        for hit in hits.drain(..) {
            self.enemy.apply_damage(&hit);
        }

        let contact = Contact::new(PLAYER, p, flatten(e - p));
        self.enemy.report_contact(&contact, &FlatHierarchy, &mut hits);
        for hit in hits.drain(..) {
            self.player.apply_damage(&hit);
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.drain() {
            match event {
                CombatEvent::HitLanded {
                    instigator, amount, ..
                } => {
                    match Fighter::of(instigator) {
                        Fighter::Player => self.summary.player_hits += 1,
                        Fighter::Enemy => self.summary.enemy_hits += 1,
                    }
                    info!(attacker = ?Fighter::of(instigator), amount, "hit landed");
                },
                CombatEvent::HitEvaded { .. } => {
                    self.summary.evasions += 1;
                    info!("hit evaded");
                },
                CombatEvent::Died { actor, .. } => {
                    let fallen = Fighter::of(actor);
                    self.summary.winner = Some(fallen.opponent());
                    info!(?fallen, winner = ?fallen.opponent(), "fighter down");
                    let finished = Arc::clone(&self.finished);
                    self.scheduler.spawn(Delay::new(self.run.linger_seconds, move || {
                        finished.store(true, Ordering::Release);
                    }));
                },
                CombatEvent::EnemyDecided { action, distance, .. } => {
                    self.summary.decisions += 1;
                    debug!(?action, distance, "enemy decided");
                },
                other => debug!(event = ?other, "combat event"),
            }
        }
    }
}

impl std::fmt::Debug for Duel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Duel")
            .field("player", &self.player)
            .field("enemy", &self.enemy)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinematic_body_integrates_velocity_change() {
        let mut body = KinematicBody::new(Vec3::ZERO, 0.5);
        body.add_force(Vec3::new(2.0, 0.0, 0.0), ForceMode::VelocityChange);
        body.integrate();
        assert!((body.position() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);

        body.add_force(Vec3::new(2.0, 0.0, 0.0), ForceMode::Force);
        assert!((body.linear_velocity().x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_fires_marks_in_order() {
        let (tx, rx) = unbounded();
        let mut clip = ClipPlayback {
            fighter: Fighter::Player,
            elapsed: 0.0,
            marks: swing_marks(1.0, true),
            next: 0,
            callbacks: tx,
        };
        assert_eq!(clip.resume(0.35), RoutineStatus::Pending);
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(clip.resume(1.0), RoutineStatus::Done);
        let rest: Vec<_> = rx.try_iter().map(|(_, c)| c).collect();
        assert_eq!(
            rest,
            vec![
                AnimationCallback::ComboWindowOpened,
                AnimationCallback::WeaponHitboxDisabled,
                AnimationCallback::ComboWindowClosed,
                AnimationCallback::AttackFinished,
            ]
        );
    }

    #[test]
    fn test_enemy_clips() {
        let config = CombatConfig::default();
        assert!(clip_marks(Fighter::Enemy, "HeavyAttack", &config).is_some());
        assert!(clip_marks(Fighter::Enemy, "Die", &config).is_none());
        assert!(clip_marks(Fighter::Player, "Hit", &config).is_none());
        let light = clip_marks(Fighter::Player, "LightAttack", &config).expect("player clip");
        assert_eq!(light.len(), 5);
    }

    #[test]
    fn test_duel_trades_blows_and_ends() {
        let config = SimConfig::default();
        let max_seconds = config.run.max_seconds;
        let summary = Duel::new(config).expect("valid duel").run();
        assert!(summary.frames > 0);
        assert!(summary.seconds <= max_seconds + 0.5);
        assert!(summary.player_hits + summary.enemy_hits > 0);
        assert!(summary.decisions > 0);
        if let Some(winner) = summary.winner {
            let loser_health = match winner {
                Fighter::Player => summary.enemy_health,
                Fighter::Enemy => summary.player_health,
            };
            assert_eq!(loser_health, 0.0);
        }
    }

    #[test]
    fn test_duel_is_reproducible() {
        let a = Duel::new(SimConfig::default()).expect("valid duel").run();
        let b = Duel::new(SimConfig::default()).expect("valid duel").run();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fighter_lookup() {
        assert_eq!(Fighter::of(PLAYER), Fighter::Player);
        assert_eq!(Fighter::of(ENEMY), Fighter::Enemy);
        assert_eq!(Fighter::Player.opponent(), Fighter::Enemy);
    }
}
